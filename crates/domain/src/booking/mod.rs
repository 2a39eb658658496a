//! Booking records and their status.

mod status;

pub use status::BookingStatus;

use chrono::{DateTime, Utc};
use common::{BookingId, EventId, UserId};
use serde::{Deserialize, Serialize};

use crate::error::RuleViolation;

/// One user's claim on a block of seats for one event.
///
/// `seats_booked` and `created_at` are fixed at creation; only `status`
/// changes, and only once (`Confirmed -> Cancelled`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: BookingId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub seats_booked: u32,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingRecord {
    /// Creates a confirmed booking with a fresh id.
    pub fn confirmed(
        user_id: UserId,
        event_id: EventId,
        seats_booked: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            user_id,
            event_id,
            seats_booked,
            status: BookingStatus::Confirmed,
            created_at: now,
        }
    }

    /// Returns true if `user_id` owns this booking.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Transitions the booking to `Cancelled`.
    pub fn cancel(&mut self) -> Result<(), RuleViolation> {
        if !self.status.can_cancel() {
            return Err(RuleViolation::InvalidTransition {
                from: self.status,
                action: "cancel",
            });
        }
        self.status = BookingStatus::Cancelled;
        Ok(())
    }
}
