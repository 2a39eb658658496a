//! Shared types for the seat reservation engine.

pub mod types;

pub use types::{BookingId, EventId, UserId};
