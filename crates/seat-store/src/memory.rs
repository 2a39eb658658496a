use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::{BookingId, EventId, UserId};
use domain::{BookingRecord, BookingStatus, EventInventory, Notification};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    Result, StoreError,
    store::{SeatStore, StoreTransaction, TransactionOptions},
};

type RowLock = Arc<Mutex<()>>;

#[derive(Default)]
struct Tables {
    events: HashMap<EventId, EventInventory>,
    bookings: HashMap<BookingId, BookingRecord>,
    notifications: Vec<Notification>,
    event_locks: HashMap<EventId, RowLock>,
    booking_locks: HashMap<BookingId, RowLock>,
}

/// In-memory seat store for tests and single-process hosts.
///
/// Each row has its own async mutex standing in for a database row lock.
/// Transactions hold owned guards for every row they lock and stage their
/// writes locally; committed values only change inside `commit`, under the
/// table write lock, so readers never observe half of a transaction.
#[derive(Clone, Default)]
pub struct InMemorySeatStore {
    tables: Arc<RwLock<Tables>>,
    fail_notifications: Arc<AtomicBool>,
}

impl InMemorySeatStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `insert_notification` fail until reset.
    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    /// Returns the total number of committed notifications.
    pub async fn notification_count(&self) -> usize {
        self.tables.read().await.notifications.len()
    }

    /// Returns the total number of committed bookings.
    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.bookings.len()
    }
}

#[async_trait]
impl SeatStore for InMemorySeatStore {
    async fn begin(&self, options: TransactionOptions) -> Result<Box<dyn StoreTransaction>> {
        Ok(Box::new(InMemoryTransaction {
            tables: self.tables.clone(),
            fail_notifications: self.fail_notifications.clone(),
            lock_timeout: options.lock_timeout,
            events: HashMap::new(),
            bookings: HashMap::new(),
            new_bookings: Vec::new(),
            notifications: Vec::new(),
        }))
    }

    async fn create_event(&self, inventory: &EventInventory) -> Result<()> {
        let mut tables = self.tables.write().await;
        match tables.events.entry(inventory.id) {
            Entry::Occupied(_) => Err(StoreError::Duplicate(format!("event {}", inventory.id))),
            Entry::Vacant(slot) => {
                slot.insert(inventory.clone());
                tables.event_locks.insert(inventory.id, RowLock::default());
                Ok(())
            }
        }
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<EventInventory>> {
        Ok(self.tables.read().await.events.get(&event_id).cloned())
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<BookingRecord>> {
        Ok(self.tables.read().await.bookings.get(&booking_id).cloned())
    }

    async fn list_bookings_for_event(&self, event_id: EventId) -> Result<Vec<BookingRecord>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<_> = tables
            .bookings
            .values()
            .filter(|b| b.event_id == event_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.created_at, b.id));
        Ok(bookings)
    }

    async fn list_bookings_for_user(&self, user_id: UserId) -> Result<Vec<BookingRecord>> {
        let tables = self.tables.read().await;
        let mut bookings: Vec<_> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| (b.created_at, b.id));
        Ok(bookings)
    }

    async fn list_notifications_for_user(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// A row locked by a transaction, with the value as this transaction sees it.
struct LockedRow<T> {
    _guard: OwnedMutexGuard<()>,
    staged: T,
    dirty: bool,
}

/// Transaction over an `InMemorySeatStore`.
///
/// Dropping it releases every row lock and discards staged writes.
pub struct InMemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    fail_notifications: Arc<AtomicBool>,
    lock_timeout: Duration,
    events: HashMap<EventId, LockedRow<EventInventory>>,
    bookings: HashMap<BookingId, LockedRow<BookingRecord>>,
    new_bookings: Vec<BookingRecord>,
    notifications: Vec<Notification>,
}

impl InMemoryTransaction {
    async fn acquire(&self, lock: RowLock, what: String) -> Result<OwnedMutexGuard<()>> {
        tracing::debug!(row = %what, "waiting for row lock");
        tokio::time::timeout(self.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| StoreError::LockTimeout(what))
    }
}

#[async_trait]
impl StoreTransaction for InMemoryTransaction {
    async fn lock_event(&mut self, event_id: EventId) -> Result<Option<EventInventory>> {
        if let Some(row) = self.events.get(&event_id) {
            return Ok(Some(row.staged.clone()));
        }

        // The table lock must not be held while waiting on the row lock.
        let lock = match self.tables.read().await.event_locks.get(&event_id) {
            Some(lock) => lock.clone(),
            None => return Ok(None),
        };
        let guard = self.acquire(lock, format!("event {event_id}")).await?;

        let current = self.tables.read().await.events.get(&event_id).cloned();
        let Some(current) = current else {
            return Ok(None);
        };
        self.events.insert(
            event_id,
            LockedRow {
                _guard: guard,
                staged: current.clone(),
                dirty: false,
            },
        );
        Ok(Some(current))
    }

    async fn lock_booking(&mut self, booking_id: BookingId) -> Result<Option<BookingRecord>> {
        if let Some(row) = self.bookings.get(&booking_id) {
            return Ok(Some(row.staged.clone()));
        }
        if let Some(booking) = self.new_bookings.iter().find(|b| b.id == booking_id) {
            return Ok(Some(booking.clone()));
        }

        let lock = match self.tables.read().await.booking_locks.get(&booking_id) {
            Some(lock) => lock.clone(),
            None => return Ok(None),
        };
        let guard = self.acquire(lock, format!("booking {booking_id}")).await?;

        let current = self.tables.read().await.bookings.get(&booking_id).cloned();
        let Some(current) = current else {
            return Ok(None);
        };
        self.bookings.insert(
            booking_id,
            LockedRow {
                _guard: guard,
                staged: current.clone(),
                dirty: false,
            },
        );
        Ok(Some(current))
    }

    async fn update_event(&mut self, inventory: &EventInventory) -> Result<()> {
        let row = self
            .events
            .get_mut(&inventory.id)
            .ok_or_else(|| StoreError::NotLocked(format!("event {}", inventory.id)))?;
        row.staged = inventory.clone();
        row.dirty = true;
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &BookingRecord) -> Result<()> {
        let exists = self.new_bookings.iter().any(|b| b.id == booking.id)
            || self.tables.read().await.bookings.contains_key(&booking.id);
        if exists {
            return Err(StoreError::Duplicate(format!("booking {}", booking.id)));
        }
        self.new_bookings.push(booking.clone());
        Ok(())
    }

    async fn update_booking_status(
        &mut self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<()> {
        if let Some(row) = self.bookings.get_mut(&booking_id) {
            row.staged.status = status;
            row.dirty = true;
            return Ok(());
        }
        if let Some(booking) = self.new_bookings.iter_mut().find(|b| b.id == booking_id) {
            booking.status = status;
            return Ok(());
        }
        Err(StoreError::NotLocked(format!("booking {booking_id}")))
    }

    async fn insert_notification(&mut self, notification: &Notification) -> Result<()> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(StoreError::Injected(format!(
                "notification for user {}",
                notification.user_id
            )));
        }
        self.notifications.push(notification.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        let mut tables = this.tables.write().await;

        for (event_id, row) in &this.events {
            if row.dirty {
                tables.events.insert(*event_id, row.staged.clone());
            }
        }
        for (booking_id, row) in &this.bookings {
            if row.dirty {
                tables.bookings.insert(*booking_id, row.staged.clone());
            }
        }
        for booking in this.new_bookings {
            tables.booking_locks.insert(booking.id, RowLock::default());
            tables.bookings.insert(booking.id, booking);
        }
        tables.notifications.extend(this.notifications);

        // Row guards in `this.events` / `this.bookings` drop after the table
        // lock, so no other transaction reads a row before its write lands.
        drop(tables);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        drop(self);
        Ok(())
    }
}
