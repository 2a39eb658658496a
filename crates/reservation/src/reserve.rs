//! Reservation orchestrator: debit inventory and create a booking atomically.

use std::time::Instant;

use common::{EventId, UserId};
use domain::BookingRecord;
use seat_store::{SeatStore, StoreTransaction};

use crate::config::HookMode;
use crate::engine::{ReservationEngine, finish};
use crate::error::ReservationError;
use crate::hook::ReservationConfirmed;

impl<S: SeatStore> ReservationEngine<S> {
    /// Reserves `seat_count` seats on `event_id` for `user_id`.
    ///
    /// Runs as one transaction holding the event's inventory row lock from
    /// the first read to the commit. On any failure nothing is written.
    /// The engine never retries; `LockTimeout` and transient storage errors
    /// are for the caller to retry.
    #[tracing::instrument(skip(self))]
    pub async fn reserve(
        &self,
        user_id: UserId,
        event_id: EventId,
        seat_count: u32,
    ) -> Result<BookingRecord, ReservationError> {
        let started = Instant::now();
        let result = self.reserve_and_notify(user_id, event_id, seat_count).await;

        let outcome = match &result {
            Ok(booking) => {
                metrics::counter!("reservation_seats_total").increment(u64::from(booking.seats_booked));
                tracing::info!(booking_id = %booking.id, "reservation confirmed");
                "confirmed"
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = %err.kind(), "reservation rejected");
                err.kind().as_str()
            }
        };
        metrics::counter!("reservations_total", "outcome" => outcome).increment(1);
        metrics::histogram!("reservation_duration_seconds").record(started.elapsed().as_secs_f64());

        result
    }

    async fn reserve_and_notify(
        &self,
        user_id: UserId,
        event_id: EventId,
        seat_count: u32,
    ) -> Result<BookingRecord, ReservationError> {
        if seat_count == 0 {
            return Err(ReservationError::InvalidSeatCount);
        }

        let mut tx = self.begin().await?;
        let result = self
            .reserve_locked(tx.as_mut(), user_id, event_id, seat_count)
            .await;
        let (booking, confirmed) = finish(tx, result).await?;

        if self.config.hook_mode == HookMode::AfterCommit {
            self.run_hook_after_commit(&confirmed).await;
        }

        Ok(booking)
    }

    /// Steps 1-7 of a reservation, on an open transaction.
    async fn reserve_locked(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: UserId,
        event_id: EventId,
        seat_count: u32,
    ) -> Result<(BookingRecord, ReservationConfirmed), ReservationError> {
        let mut inventory = tx
            .lock_event(event_id)
            .await?
            .ok_or(ReservationError::EventNotFound(event_id))?;

        let now = self.clock.now();
        inventory
            .check_reservable(seat_count, now)
            .and_then(|()| inventory.debit(seat_count))
            .map_err(|violation| ReservationError::from_violation(event_id, violation))?;
        tx.update_event(&inventory).await?;

        let booking = BookingRecord::confirmed(user_id, event_id, seat_count, now);
        tx.insert_booking(&booking).await?;

        let confirmed = ReservationConfirmed {
            booking_id: booking.id,
            user_id,
            event_id,
            event_title: inventory.title.clone(),
            seat_count,
            confirmed_at: now,
        };
        if self.config.hook_mode == HookMode::InTransaction {
            self.hook
                .on_reservation_confirmed(tx, &confirmed)
                .await
                .map_err(ReservationError::Hook)?;
        }

        tracing::debug!(
            seats_available = inventory.seats_available,
            "inventory debited"
        );
        Ok((booking, confirmed))
    }
}
