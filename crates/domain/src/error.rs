//! Business rule violations raised by the domain entities.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::booking::BookingStatus;

/// A rule on inventory or booking state was violated.
///
/// These are raised before any write happens; the orchestrators translate
/// them into their own caller-facing error kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleViolation {
    /// A reservation asked for zero seats.
    #[error("Seat count must be greater than 0")]
    SeatCountNotPositive,

    /// The event has already taken place.
    #[error("Event took place at {event_date}")]
    EventInPast { event_date: DateTime<Utc> },

    /// Fewer seats are available than were requested.
    #[error("Requested {requested} seat(s) but only {available} available")]
    InsufficientCapacity { requested: u32, available: u32 },

    /// Crediting seats back would exceed the event's total capacity.
    #[error("Crediting {seats} seat(s) to {available} available would exceed total of {total}")]
    CapacityOverflow { seats: u32, available: u32, total: u32 },

    /// A capacity change would drop below seats already booked.
    #[error("Cannot set capacity to {requested_total}: {booked} seat(s) already booked")]
    CapacityBelowBooked { requested_total: u32, booked: u32 },

    /// The booking status does not allow the requested transition.
    #[error("Invalid state transition: cannot {action} a {from} booking")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },

    /// A stored status string is not one of the known statuses.
    #[error("Unknown booking status: {0}")]
    UnknownStatus(String),
}
