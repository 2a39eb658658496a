//! Cancellation orchestrator: credit inventory and close a booking atomically.

use common::{BookingId, UserId};
use domain::BookingRecord;
use seat_store::{SeatStore, StoreTransaction};

use crate::engine::{ReservationEngine, finish};
use crate::error::CancellationError;

impl<S: SeatStore> ReservationEngine<S> {
    /// Cancels a booking and returns its seats to the event.
    ///
    /// Locks the booking row, then the event's inventory row. The owner or a
    /// privileged caller may cancel. Cancelling an already cancelled booking
    /// succeeds without touching inventory, so repeated calls credit seats
    /// back at most once.
    #[tracing::instrument(skip(self))]
    pub async fn cancel(
        &self,
        booking_id: BookingId,
        requesting_user_id: UserId,
        is_privileged: bool,
    ) -> Result<BookingRecord, CancellationError> {
        let result = self
            .cancel_in_transaction(booking_id, requesting_user_id, is_privileged)
            .await;

        let outcome = match &result {
            Ok((_, true)) => {
                tracing::info!("booking cancelled");
                "cancelled"
            }
            Ok((_, false)) => {
                tracing::debug!("booking already cancelled");
                "already_cancelled"
            }
            Err(err) => {
                tracing::warn!(error = %err, kind = %err.kind(), "cancellation rejected");
                err.kind().as_str()
            }
        };
        metrics::counter!("cancellations_total", "outcome" => outcome).increment(1);

        result.map(|(booking, _)| booking)
    }

    async fn cancel_in_transaction(
        &self,
        booking_id: BookingId,
        requesting_user_id: UserId,
        is_privileged: bool,
    ) -> Result<(BookingRecord, bool), CancellationError> {
        let mut tx = self.begin().await?;
        let result = self
            .cancel_locked(tx.as_mut(), booking_id, requesting_user_id, is_privileged)
            .await;
        finish(tx, result).await
    }

    /// Returns the booking and whether this call changed it.
    async fn cancel_locked(
        &self,
        tx: &mut dyn StoreTransaction,
        booking_id: BookingId,
        requesting_user_id: UserId,
        is_privileged: bool,
    ) -> Result<(BookingRecord, bool), CancellationError> {
        let mut booking = tx
            .lock_booking(booking_id)
            .await?
            .ok_or(CancellationError::BookingNotFound(booking_id))?;

        if !is_privileged && !booking.is_owned_by(requesting_user_id) {
            return Err(CancellationError::Unauthorized {
                booking_id,
                user_id: requesting_user_id,
            });
        }

        if booking.status.is_terminal() {
            return Ok((booking, false));
        }
        booking.cancel().map_err(CancellationError::InvalidState)?;

        let mut inventory = tx
            .lock_event(booking.event_id)
            .await?
            .ok_or(CancellationError::EventNotFound(booking.event_id))?;
        inventory
            .credit(booking.seats_booked)
            .map_err(CancellationError::InvalidState)?;

        tx.update_event(&inventory).await?;
        tx.update_booking_status(booking.id, booking.status).await?;

        tracing::debug!(
            event_id = %inventory.id,
            seats_available = inventory.seats_available,
            "inventory credited"
        );
        Ok((booking, true))
    }
}
