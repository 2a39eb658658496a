//! Domain layer for the seat reservation engine.
//!
//! This crate provides the entities the engine mutates and the pure rules
//! that guard them:
//! - `EventInventory`: total and available seats for one event
//! - `BookingRecord`: one user's claim on a block of seats, with its status
//! - `Notification`: the record written when a reservation is confirmed
//! - `Clock`: injectable source of "now" for past-event checks

pub mod booking;
pub mod clock;
pub mod error;
pub mod inventory;
pub mod notification;

pub use booking::{BookingRecord, BookingStatus};
pub use clock::{Clock, FixedClock, SystemClock};
pub use common::{BookingId, EventId, UserId};
pub use error::RuleViolation;
pub use inventory::EventInventory;
pub use notification::Notification;
