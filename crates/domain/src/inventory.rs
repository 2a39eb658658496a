//! Event inventory: the capacity record for one bookable event.

use chrono::{DateTime, Utc};
use common::EventId;
use serde::{Deserialize, Serialize};

use crate::error::RuleViolation;

/// Total and currently available seats for one event.
///
/// Invariant after every committed transaction:
/// `0 <= seats_available <= total_seats`, and
/// `total_seats - seats_available` equals the seats held by confirmed bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventInventory {
    pub id: EventId,
    pub title: String,
    pub total_seats: u32,
    pub seats_available: u32,
    pub event_date: DateTime<Utc>,
}

impl EventInventory {
    /// Creates a fully available inventory for a new event.
    pub fn new(title: impl Into<String>, total_seats: u32, event_date: DateTime<Utc>) -> Self {
        Self {
            id: EventId::new(),
            title: title.into(),
            total_seats,
            seats_available: total_seats,
            event_date,
        }
    }

    /// Seats currently held by confirmed bookings.
    pub fn booked_seats(&self) -> u32 {
        self.total_seats.saturating_sub(self.seats_available)
    }

    /// Returns true if the event date is before `now`.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.event_date < now
    }

    /// Checks whether `seat_count` seats may be reserved at `now`.
    ///
    /// A past event is rejected before capacity is considered.
    pub fn check_reservable(&self, seat_count: u32, now: DateTime<Utc>) -> Result<(), RuleViolation> {
        if seat_count == 0 {
            return Err(RuleViolation::SeatCountNotPositive);
        }
        if self.is_past(now) {
            return Err(RuleViolation::EventInPast {
                event_date: self.event_date,
            });
        }
        if seat_count > self.seats_available {
            return Err(RuleViolation::InsufficientCapacity {
                requested: seat_count,
                available: self.seats_available,
            });
        }
        Ok(())
    }

    /// Removes `seat_count` seats from the available pool.
    pub fn debit(&mut self, seat_count: u32) -> Result<(), RuleViolation> {
        self.seats_available = self.seats_available.checked_sub(seat_count).ok_or(
            RuleViolation::InsufficientCapacity {
                requested: seat_count,
                available: self.seats_available,
            },
        )?;
        Ok(())
    }

    /// Returns `seat_count` seats to the available pool.
    pub fn credit(&mut self, seat_count: u32) -> Result<(), RuleViolation> {
        let overflow = RuleViolation::CapacityOverflow {
            seats: seat_count,
            available: self.seats_available,
            total: self.total_seats,
        };
        let restored = self.seats_available.checked_add(seat_count).ok_or(overflow.clone())?;
        if restored > self.total_seats {
            return Err(overflow);
        }
        self.seats_available = restored;
        Ok(())
    }

    /// Changes total capacity, keeping every booked seat booked.
    pub fn resize(&mut self, new_total: u32) -> Result<(), RuleViolation> {
        let booked = self.booked_seats();
        if new_total < booked {
            return Err(RuleViolation::CapacityBelowBooked {
                requested_total: new_total,
                booked,
            });
        }
        self.total_seats = new_total;
        self.seats_available = new_total - booked;
        Ok(())
    }
}
