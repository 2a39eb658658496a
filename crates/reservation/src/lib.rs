//! Seat reservation engine.
//!
//! Allocates and releases finite event capacity under concurrent requests.
//! Every reservation and cancellation runs as one storage transaction that
//! holds an exclusive lock on the event's inventory row, so all operations
//! on one event are linearized and seats are never oversold or credited
//! back twice.
//!
//! Lock order is fixed:
//! - reservation: inventory row only
//! - cancellation: booking row, then inventory row
//!
//! Reservation never locks a booking row, so the two cannot deadlock.

pub mod capacity;
pub mod cancel;
pub mod config;
pub mod engine;
pub mod error;
pub mod hook;
pub mod reserve;

pub use config::{EngineConfig, HookMode, ParseHookModeError};
pub use engine::ReservationEngine;
pub use error::{CancellationError, CapacityError, ErrorKind, HookError, ReservationError};
pub use hook::{NoopHook, NotificationHook, ReservationConfirmed, ReservationHook};
