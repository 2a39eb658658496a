use std::time::Duration;

use async_trait::async_trait;
use common::{BookingId, EventId, UserId};
use domain::{BookingRecord, BookingStatus, EventInventory, Notification};

use crate::Result;

/// Lock wait applied when no timeout is configured.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for opening a transaction.
#[derive(Debug, Clone, Copy)]
pub struct TransactionOptions {
    /// Longest time a row lock acquisition may wait before failing with
    /// `StoreError::LockTimeout`.
    pub lock_timeout: Duration,
}

impl TransactionOptions {
    /// Creates options with the default lock timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options with the given lock timeout.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self { lock_timeout }
    }
}

impl Default for TransactionOptions {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

/// An open storage transaction.
///
/// Row locks taken through `lock_event` and `lock_booking` are held until the
/// transaction commits or rolls back. Writes become visible to other callers
/// only on `commit`. Dropping a transaction without committing rolls it back,
/// so an early return or a panic never leaves partial state behind.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Locks the inventory row for `event_id` and returns its current value.
    ///
    /// Blocks while another transaction holds the lock. Returns `None` if the
    /// event does not exist.
    async fn lock_event(&mut self, event_id: EventId) -> Result<Option<EventInventory>>;

    /// Locks the booking row for `booking_id` and returns its current value.
    async fn lock_booking(&mut self, booking_id: BookingId) -> Result<Option<BookingRecord>>;

    /// Writes an inventory row previously locked by this transaction.
    async fn update_event(&mut self, inventory: &EventInventory) -> Result<()>;

    /// Inserts a new booking row.
    async fn insert_booking(&mut self, booking: &BookingRecord) -> Result<()>;

    /// Sets the status of a booking row previously locked by this transaction.
    async fn update_booking_status(
        &mut self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<()>;

    /// Inserts a notification row.
    async fn insert_notification(&mut self, notification: &Notification) -> Result<()>;

    /// Makes every write of this transaction durable and releases its locks.
    async fn commit(self: Box<Self>) -> Result<()>;

    /// Discards every write of this transaction and releases its locks.
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// The storage collaborator behind the reservation engine.
///
/// The store is the sole arbiter of seat counts; nothing above it caches
/// inventory. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Opens a transaction.
    async fn begin(&self, options: TransactionOptions) -> Result<Box<dyn StoreTransaction>>;

    /// Persists a new event inventory row.
    async fn create_event(&self, inventory: &EventInventory) -> Result<()>;

    /// Reads an inventory row without locking.
    async fn get_event(&self, event_id: EventId) -> Result<Option<EventInventory>>;

    /// Reads a booking row without locking.
    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<BookingRecord>>;

    /// Lists the bookings drawn from an event, oldest first.
    async fn list_bookings_for_event(&self, event_id: EventId) -> Result<Vec<BookingRecord>>;

    /// Lists the bookings owned by a user, oldest first.
    async fn list_bookings_for_user(&self, user_id: UserId) -> Result<Vec<BookingRecord>>;

    /// Lists the notifications addressed to a user, oldest first.
    async fn list_notifications_for_user(&self, user_id: UserId) -> Result<Vec<Notification>>;
}
