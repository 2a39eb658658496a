//! Side-effect hook invoked when a reservation is confirmed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{BookingId, EventId, UserId};
use domain::Notification;
use seat_store::StoreTransaction;

use crate::error::HookError;

/// Details of a confirmed reservation handed to the hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationConfirmed {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub event_id: EventId,
    pub event_title: String,
    pub seat_count: u32,
    pub confirmed_at: DateTime<Utc>,
}

/// Collaborator told about every confirmed reservation.
///
/// The hook writes through the transaction it is handed. Under
/// `HookMode::InTransaction` that is the reservation's own transaction and
/// an error rolls the booking back; under `HookMode::AfterCommit` it is a
/// separate transaction opened after the booking committed.
#[async_trait]
pub trait ReservationHook: Send + Sync {
    async fn on_reservation_confirmed(
        &self,
        tx: &mut dyn StoreTransaction,
        confirmed: &ReservationConfirmed,
    ) -> Result<(), HookError>;
}

/// Records a confirmation `Notification` for the booking owner.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationHook;

#[async_trait]
impl ReservationHook for NotificationHook {
    async fn on_reservation_confirmed(
        &self,
        tx: &mut dyn StoreTransaction,
        confirmed: &ReservationConfirmed,
    ) -> Result<(), HookError> {
        let notification = Notification::booking_confirmed(
            confirmed.user_id,
            confirmed.event_id,
            &confirmed.event_title,
            confirmed.seat_count,
            confirmed.confirmed_at,
        );
        tx.insert_notification(&notification).await?;
        Ok(())
    }
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

#[async_trait]
impl ReservationHook for NoopHook {
    async fn on_reservation_confirmed(
        &self,
        _tx: &mut dyn StoreTransaction,
        _confirmed: &ReservationConfirmed,
    ) -> Result<(), HookError> {
        Ok(())
    }
}
