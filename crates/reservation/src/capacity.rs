//! Capacity changes on an existing event.

use common::EventId;
use domain::EventInventory;
use seat_store::SeatStore;

use crate::engine::{ReservationEngine, finish};
use crate::error::CapacityError;

impl<S: SeatStore> ReservationEngine<S> {
    /// Sets the total seat count of an event.
    ///
    /// Serializes with reservations and cancellations through the same
    /// inventory row lock. Seats already booked stay booked, so the new total
    /// may not be lower than the booked count.
    #[tracing::instrument(skip(self))]
    pub async fn adjust_capacity(
        &self,
        event_id: EventId,
        new_total: u32,
    ) -> Result<EventInventory, CapacityError> {
        let mut tx = self.begin().await?;

        let result: Result<EventInventory, CapacityError> = async {
            let mut inventory = tx
                .lock_event(event_id)
                .await?
                .ok_or(CapacityError::EventNotFound(event_id))?;
            inventory
                .resize(new_total)
                .map_err(CapacityError::BelowBooked)?;
            tx.update_event(&inventory).await?;
            Ok(inventory)
        }
        .await;

        let inventory = finish(tx, result).await?;
        tracing::info!(
            total_seats = inventory.total_seats,
            seats_available = inventory.seats_available,
            "capacity adjusted"
        );
        Ok(inventory)
    }
}
