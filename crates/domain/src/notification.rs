//! Confirmation notice written when a reservation commits.

use chrono::{DateTime, Utc};
use common::{EventId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A notification addressed to the user who made a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: UserId,
    pub event_id: EventId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Builds the confirmation notice for a reservation.
    pub fn booking_confirmed(
        user_id: UserId,
        event_id: EventId,
        event_title: &str,
        seat_count: u32,
        now: DateTime<Utc>,
    ) -> Self {
        let noun = if seat_count == 1 { "seat" } else { "seats" };
        Self {
            id: Uuid::new_v4(),
            user_id,
            event_id,
            message: format!("Your booking for {event_title} is confirmed: {seat_count} {noun}."),
            created_at: now,
        }
    }
}
