//! The reservation engine: shared state and read accessors.
//!
//! The orchestrators themselves live in `reserve`, `cancel` and `capacity`.

use std::sync::Arc;

use common::{BookingId, EventId, UserId};
use domain::{BookingRecord, Clock, EventInventory, Notification, SystemClock};
use seat_store::{SeatStore, StoreError, StoreTransaction};

use crate::config::EngineConfig;
use crate::error::HookError;
use crate::hook::{NotificationHook, ReservationConfirmed, ReservationHook};

/// Allocates and releases event seats over a transactional store.
///
/// The engine keeps no seat counts of its own; every decision is made on
/// rows locked inside the transaction that writes them.
pub struct ReservationEngine<S: SeatStore> {
    pub(crate) store: S,
    pub(crate) config: EngineConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) hook: Arc<dyn ReservationHook>,
}

impl<S: SeatStore> ReservationEngine<S> {
    /// Creates an engine using the system clock and the notification hook.
    pub fn new(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            clock: Arc::new(SystemClock),
            hook: Arc::new(NotificationHook),
        }
    }

    /// Replaces the clock used for past-event checks and timestamps.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Replaces the side-effect hook.
    pub fn with_hook(mut self, hook: impl ReservationHook + 'static) -> Self {
        self.hook = Arc::new(hook);
        self
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Persists a new event inventory row.
    #[tracing::instrument(skip(self, inventory), fields(event_id = %inventory.id))]
    pub async fn create_event(&self, inventory: &EventInventory) -> Result<(), StoreError> {
        self.store.create_event(inventory).await?;
        tracing::info!(total_seats = inventory.total_seats, "event created");
        Ok(())
    }

    /// Reads an event without locking.
    pub async fn get_event(&self, event_id: EventId) -> Result<Option<EventInventory>, StoreError> {
        self.store.get_event(event_id).await
    }

    /// Reads a booking without locking.
    pub async fn get_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingRecord>, StoreError> {
        self.store.get_booking(booking_id).await
    }

    /// Lists the bookings drawn from an event.
    pub async fn bookings_for_event(
        &self,
        event_id: EventId,
    ) -> Result<Vec<BookingRecord>, StoreError> {
        self.store.list_bookings_for_event(event_id).await
    }

    /// Lists the bookings owned by a user.
    pub async fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<BookingRecord>, StoreError> {
        self.store.list_bookings_for_user(user_id).await
    }

    /// Lists the notifications addressed to a user.
    pub async fn notifications_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, StoreError> {
        self.store.list_notifications_for_user(user_id).await
    }

    /// Opens a transaction with the configured lock timeout.
    pub(crate) async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        self.store.begin(self.config.transaction_options()).await
    }

    /// Runs the hook on its own transaction after a reservation committed.
    ///
    /// Bounded by the lock timeout. Failures and timeouts are logged and
    /// counted; the reservation stands.
    pub(crate) async fn run_hook_after_commit(&self, confirmed: &ReservationConfirmed) {
        let limit = self.config.lock_timeout;
        let outcome: Result<(), HookError> = tokio::time::timeout(limit, async {
            let mut tx = self.begin().await?;
            let result = self
                .hook
                .on_reservation_confirmed(tx.as_mut(), confirmed)
                .await;
            finish(tx, result).await
        })
        .await
        .unwrap_or(Err(HookError::TimedOut(limit)));

        if let Err(err) = outcome {
            metrics::counter!("reservation_hook_failures_total").increment(1);
            tracing::warn!(
                booking_id = %confirmed.booking_id,
                error = %err,
                "reservation hook failed after commit"
            );
        }
    }
}

/// Ends a transaction: commit on success, roll back on failure.
///
/// A failed rollback is only logged; the transaction is discarded either
/// way and the original error is what the caller sees.
pub(crate) async fn finish<T, E>(tx: Box<dyn StoreTransaction>, result: Result<T, E>) -> Result<T, E>
where
    E: From<StoreError>,
{
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}
