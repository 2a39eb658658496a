use async_trait::async_trait;
use common::{BookingId, EventId, UserId};
use domain::{BookingRecord, BookingStatus, EventInventory, Notification};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    Result, StoreError,
    store::{SeatStore, StoreTransaction, TransactionOptions},
};

const EVENT_COLUMNS: &str = "id, title, total_seats, seats_available, event_date";
const BOOKING_COLUMNS: &str = "id, user_id, event_id, seats_booked, status, created_at";

/// PostgreSQL-backed seat store implementation.
///
/// Row locks are `SELECT ... FOR UPDATE` inside a transaction whose
/// `lock_timeout` is set from `TransactionOptions`.
#[derive(Clone)]
pub struct PostgresSeatStore {
    pool: PgPool,
}

impl PostgresSeatStore {
    /// Creates a new PostgreSQL seat store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn to_count(value: u32) -> i64 {
    i64::from(value)
}

fn from_count(row: &PgRow, column: &str) -> Result<u32> {
    let value: i64 = row.try_get(column)?;
    u32::try_from(value)
        .map_err(|_| StoreError::InvalidData(format!("{column} out of range: {value}")))
}

fn row_to_event(row: PgRow) -> Result<EventInventory> {
    Ok(EventInventory {
        id: EventId::from_uuid(row.try_get::<Uuid, _>("id")?),
        title: row.try_get("title")?,
        total_seats: from_count(&row, "total_seats")?,
        seats_available: from_count(&row, "seats_available")?,
        event_date: row.try_get("event_date")?,
    })
}

fn row_to_booking(row: PgRow) -> Result<BookingRecord> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<BookingStatus>()
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;

    Ok(BookingRecord {
        id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        event_id: EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?),
        seats_booked: from_count(&row, "seats_booked")?,
        status,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_notification(row: PgRow) -> Result<Notification> {
    Ok(Notification {
        id: row.try_get("id")?,
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id")?),
        event_id: EventId::from_uuid(row.try_get::<Uuid, _>("event_id")?),
        message: row.try_get("message")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl SeatStore for PostgresSeatStore {
    async fn begin(&self, options: TransactionOptions) -> Result<Box<dyn StoreTransaction>> {
        let mut tx = self.pool.begin().await?;

        // SET does not take bind parameters; the value is an integer we format ourselves.
        let timeout_ms = options.lock_timeout.as_millis().max(1);
        sqlx::query(&format!("SET LOCAL lock_timeout = '{timeout_ms}ms'"))
            .execute(&mut *tx)
            .await?;

        Ok(Box::new(PostgresTransaction { tx }))
    }

    async fn create_event(&self, inventory: &EventInventory) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO events (id, title, total_seats, seats_available, event_date)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(inventory.id.as_uuid())
        .bind(&inventory.title)
        .bind(to_count(inventory.total_seats))
        .bind(to_count(inventory.seats_available))
        .bind(inventory.event_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_event(&self, event_id: EventId) -> Result<Option<EventInventory>> {
        let row = sqlx::query(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"))
            .bind(event_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_event).transpose()
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<BookingRecord>> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(booking_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(row_to_booking).transpose()
    }

    async fn list_bookings_for_event(&self, event_id: EventId) -> Result<Vec<BookingRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE event_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(event_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn list_bookings_for_user(&self, user_id: UserId) -> Result<Vec<BookingRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_booking).collect()
    }

    async fn list_notifications_for_user(&self, user_id: UserId) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, event_id, message, created_at
            FROM notifications
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_notification).collect()
    }
}

/// Transaction over a `PostgresSeatStore`.
///
/// Wraps an sqlx transaction, which rolls back when dropped uncommitted.
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PostgresTransaction {
    async fn lock_event(&mut self, event_id: EventId) -> Result<Option<EventInventory>> {
        tracing::debug!(%event_id, "locking event row");
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1 FOR UPDATE"
        ))
        .bind(event_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_event).transpose()
    }

    async fn lock_booking(&mut self, booking_id: BookingId) -> Result<Option<BookingRecord>> {
        tracing::debug!(%booking_id, "locking booking row");
        let row = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(booking_id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(row_to_booking).transpose()
    }

    async fn update_event(&mut self, inventory: &EventInventory) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE events
            SET title = $2, total_seats = $3, seats_available = $4, event_date = $5
            WHERE id = $1
            "#,
        )
        .bind(inventory.id.as_uuid())
        .bind(&inventory.title)
        .bind(to_count(inventory.total_seats))
        .bind(to_count(inventory.seats_available))
        .bind(inventory.event_date)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("event {}", inventory.id)));
        }
        Ok(())
    }

    async fn insert_booking(&mut self, booking: &BookingRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (id, user_id, event_id, seats_booked, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(booking.id.as_uuid())
        .bind(booking.user_id.as_uuid())
        .bind(booking.event_id.as_uuid())
        .bind(to_count(booking.seats_booked))
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn update_booking_status(
        &mut self,
        booking_id: BookingId,
        status: BookingStatus,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE bookings SET status = $2 WHERE id = $1")
            .bind(booking_id.as_uuid())
            .bind(status.as_str())
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("booking {booking_id}")));
        }
        Ok(())
    }

    async fn insert_notification(&mut self, notification: &Notification) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, event_id, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(notification.id)
        .bind(notification.user_id.as_uuid())
        .bind(notification.event_id.as_uuid())
        .bind(&notification.message)
        .bind(notification.created_at)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
