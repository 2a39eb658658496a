//! Engine error types.

use chrono::{DateTime, Utc};
use common::{BookingId, EventId, UserId};
use domain::RuleViolation;
use seat_store::StoreError;
use thiserror::Error;

/// Stable classification of every engine failure.
///
/// Callers branch on the kind (sold out vs. event already started vs. not
/// your booking) instead of matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request itself is malformed (e.g. zero seats).
    InvalidInput,
    /// The referenced event or booking does not exist.
    NotFound,
    /// The event has passed or the booking cannot make this transition.
    InvalidState,
    /// Fewer seats are available than requested.
    InsufficientCapacity,
    /// The caller may not act on this booking.
    Unauthorized,
    /// A row lock could not be acquired in time.
    LockTimeout,
    /// The storage layer reported a transient conflict.
    Transient,
    /// The side-effect hook failed inside the reservation transaction.
    HookFailed,
    /// Any other storage failure.
    Storage,
}

impl ErrorKind {
    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::LockTimeout | ErrorKind::Transient)
    }

    /// Returns a stable snake_case code for the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::InsufficientCapacity => "insufficient_capacity",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::LockTimeout => "lock_timeout",
            ErrorKind::Transient => "transient",
            ErrorKind::HookFailed => "hook_failed",
            ErrorKind::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&StoreError> for ErrorKind {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::LockTimeout(_) => ErrorKind::LockTimeout,
            StoreError::Conflict(_) | StoreError::Unavailable(_) => ErrorKind::Transient,
            _ => ErrorKind::Storage,
        }
    }
}

/// Errors raised by the side-effect hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// The hook's write was rejected by the store.
    #[error("Hook storage error: {0}")]
    Store(#[from] StoreError),

    /// The hook failed for a reason of its own.
    #[error("Hook failed: {0}")]
    Failed(String),

    /// The hook did not finish within the allotted time.
    #[error("Hook timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

/// Errors that can occur while reserving seats.
#[derive(Debug, Error)]
pub enum ReservationError {
    /// Zero seats were requested.
    #[error("Seat count must be greater than 0")]
    InvalidSeatCount,

    /// The event does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The event has already taken place.
    #[error("Event {event_id} took place at {event_date}")]
    EventInPast {
        event_id: EventId,
        event_date: DateTime<Utc>,
    },

    /// Not enough seats are left.
    #[error("Insufficient capacity: requested {requested} seat(s), {available} available")]
    InsufficientCapacity { requested: u32, available: u32 },

    /// Any other rule violation on the locked inventory.
    #[error("Invalid state: {0}")]
    InvalidState(RuleViolation),

    /// The in-transaction hook failed; the reservation was rolled back.
    #[error("Reservation hook failed: {0}")]
    Hook(#[source] HookError),

    /// The store failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl ReservationError {
    pub(crate) fn from_violation(event_id: EventId, violation: RuleViolation) -> Self {
        match violation {
            RuleViolation::SeatCountNotPositive => ReservationError::InvalidSeatCount,
            RuleViolation::EventInPast { event_date } => ReservationError::EventInPast {
                event_id,
                event_date,
            },
            RuleViolation::InsufficientCapacity {
                requested,
                available,
            } => ReservationError::InsufficientCapacity {
                requested,
                available,
            },
            other => ReservationError::InvalidState(other),
        }
    }

    /// Returns the stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::InvalidSeatCount => ErrorKind::InvalidInput,
            ReservationError::EventNotFound(_) => ErrorKind::NotFound,
            ReservationError::EventInPast { .. } | ReservationError::InvalidState(_) => {
                ErrorKind::InvalidState
            }
            ReservationError::InsufficientCapacity { .. } => ErrorKind::InsufficientCapacity,
            ReservationError::Hook(_) => ErrorKind::HookFailed,
            ReservationError::Store(err) => ErrorKind::from(err),
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Errors that can occur while cancelling a booking.
#[derive(Debug, Error)]
pub enum CancellationError {
    /// The booking does not exist.
    #[error("Booking not found: {0}")]
    BookingNotFound(BookingId),

    /// The booking's event row is missing.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The caller neither owns the booking nor is privileged.
    #[error("User {user_id} may not cancel booking {booking_id}")]
    Unauthorized {
        booking_id: BookingId,
        user_id: UserId,
    },

    /// The booking cannot be cancelled from its current status.
    #[error("Invalid state: {0}")]
    InvalidState(RuleViolation),

    /// The store failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl CancellationError {
    /// Returns the stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CancellationError::BookingNotFound(_) | CancellationError::EventNotFound(_) => {
                ErrorKind::NotFound
            }
            CancellationError::Unauthorized { .. } => ErrorKind::Unauthorized,
            CancellationError::InvalidState(_) => ErrorKind::InvalidState,
            CancellationError::Store(err) => ErrorKind::from(err),
        }
    }

    /// Returns true if the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

/// Errors that can occur while changing an event's capacity.
#[derive(Debug, Error)]
pub enum CapacityError {
    /// The event does not exist.
    #[error("Event not found: {0}")]
    EventNotFound(EventId),

    /// The new total would not cover seats already booked.
    #[error("Invalid capacity: {0}")]
    BelowBooked(RuleViolation),

    /// The store failed.
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl CapacityError {
    /// Returns the stable classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CapacityError::EventNotFound(_) => ErrorKind::NotFound,
            CapacityError::BelowBooked(_) => ErrorKind::InvalidState,
            CapacityError::Store(err) => ErrorKind::from(err),
        }
    }
}
