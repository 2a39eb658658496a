//! Booking status state machine.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RuleViolation;

/// The lifecycle status of a booking.
///
/// State transitions:
/// ```text
/// Confirmed ──► Cancelled
/// ```
///
/// `Pending` is part of the status domain but the engine never assigns it;
/// a pending booking can be neither confirmed nor cancelled here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Seats are held but not yet confirmed.
    Pending,

    /// Seats are debited from inventory and belong to the booking owner.
    Confirmed,

    /// Seats were returned to inventory (terminal state).
    Cancelled,
}

impl BookingStatus {
    /// Returns true if the booking's seats count against inventory.
    pub fn holds_seats(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }

    /// Returns true if the booking can be cancelled from this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }

    /// Returns true if this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Cancelled)
    }

    /// Returns the stored representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = RuleViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            other => Err(RuleViolation::UnknownStatus(other.to_string())),
        }
    }
}
