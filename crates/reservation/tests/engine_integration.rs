//! Integration tests for the reservation engine over the in-memory store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use common::{BookingId, EventId, UserId};
use domain::{BookingRecord, BookingStatus, EventInventory, FixedClock};
use reservation::{
    CancellationError, CapacityError, EngineConfig, ErrorKind, HookError, HookMode, NoopHook,
    ReservationConfirmed, ReservationEngine, ReservationError, ReservationHook,
};
use seat_store::{InMemorySeatStore, SeatStore, StoreTransaction, TransactionOptions};

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 6, 1, 18, 0, 0).unwrap()
}

fn engine_with(config: EngineConfig) -> ReservationEngine<InMemorySeatStore> {
    ReservationEngine::new(InMemorySeatStore::new(), config).with_clock(FixedClock(now()))
}

fn engine() -> ReservationEngine<InMemorySeatStore> {
    engine_with(EngineConfig::default())
}

async fn seed(engine: &ReservationEngine<InMemorySeatStore>, total: u32) -> EventInventory {
    let event = EventInventory::new("Symphony No. 9", total, now() + ChronoDuration::days(10));
    engine.create_event(&event).await.unwrap();
    event
}

async fn seats_available(engine: &ReservationEngine<InMemorySeatStore>, id: EventId) -> u32 {
    engine.get_event(id).await.unwrap().unwrap().seats_available
}

/// `total - available` must equal the seats held by confirmed bookings.
async fn assert_capacity_invariant(engine: &ReservationEngine<InMemorySeatStore>, id: EventId) {
    let event = engine.get_event(id).await.unwrap().unwrap();
    let confirmed: u32 = engine
        .bookings_for_event(id)
        .await
        .unwrap()
        .iter()
        .filter(|b| b.status.holds_seats())
        .map(|b| b.seats_booked)
        .sum();
    assert!(event.seats_available <= event.total_seats);
    assert_eq!(event.total_seats - event.seats_available, confirmed);
}

/// Hook that always fails.
struct FailingHook;

#[async_trait]
impl ReservationHook for FailingHook {
    async fn on_reservation_confirmed(
        &self,
        _tx: &mut dyn StoreTransaction,
        _confirmed: &ReservationConfirmed,
    ) -> Result<(), HookError> {
        Err(HookError::Failed("queue unavailable".to_string()))
    }
}

/// Hook that never finishes in any reasonable time.
struct StalledHook;

#[async_trait]
impl ReservationHook for StalledHook {
    async fn on_reservation_confirmed(
        &self,
        _tx: &mut dyn StoreTransaction,
        _confirmed: &ReservationConfirmed,
    ) -> Result<(), HookError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

mod reserve {
    use super::*;

    #[tokio::test]
    async fn end_to_end_scenario() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        let alice = UserId::new();
        let bob = UserId::new();

        let first = engine.reserve(alice, event.id, 6).await.unwrap();
        assert_eq!(first.status, BookingStatus::Confirmed);
        assert_eq!(first.seats_booked, 6);
        assert_eq!(seats_available(&engine, event.id).await, 4);

        let err = engine.reserve(bob, event.id, 5).await.unwrap_err();
        assert!(matches!(
            err,
            ReservationError::InsufficientCapacity {
                requested: 5,
                available: 4
            }
        ));
        assert_eq!(seats_available(&engine, event.id).await, 4);

        let cancelled = engine.cancel(first.id, alice, false).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(seats_available(&engine, event.id).await, 10);

        let second = engine.reserve(bob, event.id, 5).await.unwrap();
        assert_eq!(second.status, BookingStatus::Confirmed);
        assert_eq!(seats_available(&engine, event.id).await, 5);

        assert_capacity_invariant(&engine, event.id).await;
    }

    #[tokio::test]
    async fn reserving_exactly_the_remaining_seats_succeeds() {
        let engine = engine();
        let event = seed(&engine, 3).await;

        engine.reserve(UserId::new(), event.id, 3).await.unwrap();
        assert_eq!(seats_available(&engine, event.id).await, 0);

        let err = engine.reserve(UserId::new(), event.id, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientCapacity);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let engine = engine();
        let missing = EventId::new();

        let err = engine.reserve(UserId::new(), missing, 1).await.unwrap_err();
        assert!(matches!(err, ReservationError::EventNotFound(id) if id == missing));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn zero_seats_is_invalid_input() {
        let engine = engine();
        let event = seed(&engine, 5).await;

        let err = engine.reserve(UserId::new(), event.id, 0).await.unwrap_err();
        assert!(matches!(err, ReservationError::InvalidSeatCount));
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(seats_available(&engine, event.id).await, 5);
    }

    #[tokio::test]
    async fn past_event_is_rejected_regardless_of_seats() {
        let engine = engine();
        let event = EventInventory::new("Last Night", 500, now() - ChronoDuration::hours(2));
        engine.create_event(&event).await.unwrap();

        for seats in [1, 500, 501] {
            let err = engine.reserve(UserId::new(), event.id, seats).await.unwrap_err();
            assert!(matches!(err, ReservationError::EventInPast { .. }), "{err:?}");
            assert_eq!(err.kind(), ErrorKind::InvalidState);
        }
        assert_eq!(seats_available(&engine, event.id).await, 500);
        assert!(engine.bookings_for_event(event.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn booking_records_owner_event_and_timestamp() {
        let engine = engine();
        let event = seed(&engine, 5).await;
        let user = UserId::new();

        let booking = engine.reserve(user, event.id, 2).await.unwrap();
        assert_eq!(booking.user_id, user);
        assert_eq!(booking.event_id, event.id);
        assert_eq!(booking.created_at, now());

        let stored = engine.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored, booking);
        assert_eq!(engine.bookings_for_user(user).await.unwrap(), vec![booking]);
    }

    #[tokio::test]
    async fn lock_held_elsewhere_times_out_and_is_retryable() {
        let engine = engine_with(EngineConfig::default().with_lock_timeout(Duration::from_millis(50)));
        let event = seed(&engine, 5).await;

        let mut holder = engine.store().begin(TransactionOptions::new()).await.unwrap();
        holder.lock_event(event.id).await.unwrap();

        let err = engine.reserve(UserId::new(), event.id, 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LockTimeout);
        assert!(err.is_retryable());

        holder.rollback().await.unwrap();
        engine.reserve(UserId::new(), event.id, 1).await.unwrap();
        assert_eq!(seats_available(&engine, event.id).await, 4);
    }

    #[tokio::test]
    async fn lock_on_one_event_does_not_block_another() {
        let engine = engine_with(EngineConfig::default().with_lock_timeout(Duration::from_millis(50)));
        let busy = seed(&engine, 5).await;
        let free = seed(&engine, 5).await;

        let mut holder = engine.store().begin(TransactionOptions::new()).await.unwrap();
        holder.lock_event(busy.id).await.unwrap();

        engine.reserve(UserId::new(), free.id, 2).await.unwrap();
        assert_eq!(seats_available(&engine, free.id).await, 3);
    }
}

mod cancel {
    use super::*;

    #[tokio::test]
    async fn cancelling_twice_credits_seats_once() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        let user = UserId::new();
        let booking = engine.reserve(user, event.id, 4).await.unwrap();

        let first = engine.cancel(booking.id, user, false).await.unwrap();
        let second = engine.cancel(booking.id, user, false).await.unwrap();

        assert_eq!(first.status, BookingStatus::Cancelled);
        assert_eq!(second, first);
        assert_eq!(seats_available(&engine, event.id).await, 10);
        assert_capacity_invariant(&engine, event.id).await;
    }

    #[tokio::test]
    async fn non_owner_is_unauthorized_and_inventory_is_unchanged() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        let owner = UserId::new();
        let stranger = UserId::new();
        let booking = engine.reserve(owner, event.id, 3).await.unwrap();

        let err = engine.cancel(booking.id, stranger, false).await.unwrap_err();
        assert!(matches!(err, CancellationError::Unauthorized { .. }));
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        assert_eq!(seats_available(&engine, event.id).await, 7);
        let stored = engine.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn non_owner_cannot_probe_cancelled_bookings() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        let owner = UserId::new();
        let booking = engine.reserve(owner, event.id, 1).await.unwrap();
        engine.cancel(booking.id, owner, false).await.unwrap();

        let err = engine.cancel(booking.id, UserId::new(), false).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn privileged_caller_may_cancel_any_booking() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        let booking = engine.reserve(UserId::new(), event.id, 5).await.unwrap();

        let cancelled = engine.cancel(booking.id, UserId::new(), true).await.unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(seats_available(&engine, event.id).await, 10);
    }

    #[tokio::test]
    async fn unknown_booking_is_not_found() {
        let engine = engine();
        let missing = BookingId::new();

        let err = engine.cancel(missing, UserId::new(), true).await.unwrap_err();
        assert!(matches!(err, CancellationError::BookingNotFound(id) if id == missing));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn pending_booking_is_invalid_state() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        let user = UserId::new();

        let mut pending = BookingRecord::confirmed(user, event.id, 2, now());
        pending.status = BookingStatus::Pending;
        let mut tx = engine.store().begin(TransactionOptions::new()).await.unwrap();
        tx.insert_booking(&pending).await.unwrap();
        tx.commit().await.unwrap();

        let err = engine.cancel(pending.id, user, false).await.unwrap_err();
        assert!(matches!(err, CancellationError::InvalidState(_)));
        assert_eq!(seats_available(&engine, event.id).await, 10);
    }

    #[tokio::test]
    async fn cancellation_succeeds_after_event_date() {
        let engine = engine();
        let event = seed(&engine, 4).await;
        let user = UserId::new();
        let booking = engine.reserve(user, event.id, 4).await.unwrap();

        let late_engine = ReservationEngine::new(engine.store().clone(), EngineConfig::default())
            .with_clock(FixedClock(event.event_date + ChronoDuration::days(1)));

        late_engine.cancel(booking.id, user, false).await.unwrap();
        assert_eq!(seats_available(&engine, event.id).await, 4);
    }
}

mod hooks {
    use super::*;

    #[tokio::test]
    async fn in_transaction_hook_writes_notification_with_the_booking() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        let user = UserId::new();

        engine.reserve(user, event.id, 2).await.unwrap();

        let notices = engine.notifications_for_user(user).await.unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].event_id, event.id);
        assert!(notices[0].message.contains("Symphony No. 9"));
    }

    #[tokio::test]
    async fn in_transaction_hook_failure_rolls_back_the_reservation() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        let user = UserId::new();
        engine.store().set_fail_notifications(true);

        let err = engine.reserve(user, event.id, 3).await.unwrap_err();
        assert!(matches!(err, ReservationError::Hook(HookError::Store(_))));
        assert_eq!(err.kind(), ErrorKind::HookFailed);

        assert_eq!(seats_available(&engine, event.id).await, 10);
        assert!(engine.bookings_for_user(user).await.unwrap().is_empty());
        assert_eq!(engine.store().notification_count().await, 0);
    }

    #[tokio::test]
    async fn custom_hook_failure_rolls_back_in_transaction() {
        let engine = engine().with_hook(FailingHook);
        let event = seed(&engine, 10).await;

        let err = engine.reserve(UserId::new(), event.id, 1).await.unwrap_err();
        assert!(matches!(err, ReservationError::Hook(HookError::Failed(_))));
        assert_eq!(seats_available(&engine, event.id).await, 10);
    }

    #[tokio::test]
    async fn after_commit_hook_failure_keeps_the_booking() {
        let engine = engine_with(EngineConfig::default().with_hook_mode(HookMode::AfterCommit));
        let event = seed(&engine, 10).await;
        let user = UserId::new();
        engine.store().set_fail_notifications(true);

        let booking = engine.reserve(user, event.id, 3).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(seats_available(&engine, event.id).await, 7);
        assert_eq!(engine.store().notification_count().await, 0);
        assert_capacity_invariant(&engine, event.id).await;
    }

    #[tokio::test]
    async fn stalled_after_commit_hook_does_not_hold_up_the_reservation() {
        let config = EngineConfig::default()
            .with_hook_mode(HookMode::AfterCommit)
            .with_lock_timeout(Duration::from_millis(50));
        let engine = engine_with(config).with_hook(StalledHook);
        let event = seed(&engine, 10).await;
        let user = UserId::new();

        let booking = tokio::time::timeout(
            Duration::from_secs(5),
            engine.reserve(user, event.id, 4),
        )
        .await
        .expect("reservation waited on the hook")
        .unwrap();

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(seats_available(&engine, event.id).await, 6);
        assert_eq!(engine.store().notification_count().await, 0);
        assert_capacity_invariant(&engine, event.id).await;
    }

    #[tokio::test]
    async fn after_commit_hook_writes_notification() {
        let engine = engine_with(EngineConfig::default().with_hook_mode(HookMode::AfterCommit));
        let event = seed(&engine, 10).await;
        let user = UserId::new();

        engine.reserve(user, event.id, 1).await.unwrap();
        assert_eq!(engine.notifications_for_user(user).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn noop_hook_writes_nothing() {
        let engine = engine().with_hook(NoopHook);
        let event = seed(&engine, 10).await;

        engine.reserve(UserId::new(), event.id, 1).await.unwrap();
        assert_eq!(engine.store().notification_count().await, 0);
    }
}

mod capacity {
    use super::*;

    #[tokio::test]
    async fn growing_capacity_adds_available_seats() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        engine.reserve(UserId::new(), event.id, 8).await.unwrap();

        let resized = engine.adjust_capacity(event.id, 15).await.unwrap();
        assert_eq!(resized.total_seats, 15);
        assert_eq!(resized.seats_available, 7);
        assert_capacity_invariant(&engine, event.id).await;
    }

    #[tokio::test]
    async fn capacity_below_booked_is_rejected() {
        let engine = engine();
        let event = seed(&engine, 10).await;
        engine.reserve(UserId::new(), event.id, 8).await.unwrap();

        let err = engine.adjust_capacity(event.id, 7).await.unwrap_err();
        assert!(matches!(err, CapacityError::BelowBooked(_)));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(seats_available(&engine, event.id).await, 2);
    }

    #[tokio::test]
    async fn unknown_event_capacity_is_not_found() {
        let engine = engine();
        let err = engine.adjust_capacity(EventId::new(), 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

mod invariant {
    use super::*;

    #[tokio::test]
    async fn invariant_holds_across_a_mixed_sequence() {
        let engine = engine();
        let event = seed(&engine, 20).await;
        let users: Vec<UserId> = (0..5).map(|_| UserId::new()).collect();
        let mut held = Vec::new();

        for step in 0..40u32 {
            let user = users[(step % 5) as usize];
            if step % 3 == 2 && !held.is_empty() {
                let (booking_id, owner) = held.remove(0);
                engine.cancel(booking_id, owner, false).await.unwrap();
            } else {
                match engine.reserve(user, event.id, step % 4 + 1).await {
                    Ok(booking) => held.push((booking.id, user)),
                    Err(err) => assert_eq!(err.kind(), ErrorKind::InsufficientCapacity),
                }
            }
            assert_capacity_invariant(&engine, event.id).await;
        }
    }
}
