//! HTTP route handlers.

pub mod bookings;
pub mod events;
pub mod health;
pub mod identity;
pub mod metrics;

use reservation::ReservationEngine;
use seat_store::SeatStore;

/// Shared application state accessible from all handlers.
pub struct AppState<S: SeatStore> {
    pub engine: ReservationEngine<S>,
}

impl<S: SeatStore> AppState<S> {
    pub fn new(engine: ReservationEngine<S>) -> Self {
        Self { engine }
    }
}
