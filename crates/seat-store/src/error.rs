use thiserror::Error;

/// SQLSTATE raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE raised on serializable isolation conflicts.
const SERIALIZATION_FAILURE: &str = "40001";
const DEADLOCK_DETECTED: &str = "40P01";
const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur when interacting with the seat store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A row lock could not be acquired within the configured timeout.
    #[error("Timed out waiting for lock on {0}")]
    LockTimeout(String),

    /// The transaction lost a serialization race or was picked as a deadlock victim.
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// The database could not be reached or dropped the connection.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    /// The row to write does not exist.
    #[error("Row not found: {0}")]
    NotFound(String),

    /// A row with the same id already exists.
    #[error("Duplicate row: {0}")]
    Duplicate(String),

    /// A write targeted a row this transaction has not locked.
    #[error("Row not locked by this transaction: {0}")]
    NotLocked(String),

    /// A stored value could not be mapped onto the domain types.
    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    /// A write was rejected by an injected failure.
    #[error("Injected failure: {0}")]
    Injected(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Returns true if the caller may retry the whole operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::LockTimeout(_) | StoreError::Conflict(_) | StoreError::Unavailable(_)
        )
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(
            err,
            sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::Io(_)
                | sqlx::Error::WorkerCrashed
        ) {
            return StoreError::Unavailable(err.to_string());
        }

        let code = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned());

        match code.as_deref() {
            Some(LOCK_NOT_AVAILABLE) => StoreError::LockTimeout(err.to_string()),
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => StoreError::Conflict(err.to_string()),
            Some(UNIQUE_VIOLATION) => StoreError::Duplicate(err.to_string()),
            _ => StoreError::Database(err),
        }
    }
}

/// Result type for seat store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
