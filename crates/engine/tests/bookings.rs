mod common;

use common::{admin, at, car, customer, date, engine_with_db, now, period, request};
use engine::{BookingFilter, BookingStatus, CancellationQuote, EngineError, NotificationKind};

#[tokio::test]
async fn create_booking_freezes_price_and_reserves_car() {
    let (engine, _db) = engine_with_db().await;
    let root = admin(&engine).await;
    let alice = customer(&engine, "alice").await;
    let bob = customer(&engine, "bob").await;
    let panda = car(&engine, root.id, "AA000AA").await;

    let booking = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 5, 10), date(2026, 5, 13)),
            now(),
        )
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.price.days, 3);
    assert_eq!(booking.price.base_minor, 30_000);
    assert_eq!(booking.price.duration_discount_minor, 0);
    assert_eq!(booking.price.tax_minor, 5_400);
    assert_eq!(booking.price.total_minor, 35_400);
    assert_eq!(booking.price.amount_due_minor, 35_400);
    assert_eq!(booking.paid_minor(), 0);

    let kinds: Vec<_> = engine
        .notifications(alice.id, false)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.kind)
        .collect();
    assert!(kinds.contains(&NotificationKind::BookingCreated));

    let err = engine
        .create_booking(
            bob.id,
            request(panda.id, date(2026, 5, 12), date(2026, 5, 14)),
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CarUnavailable(_)));

    engine
        .create_booking(
            bob.id,
            request(panda.id, date(2026, 5, 13), date(2026, 5, 15)),
            now(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn quote_applies_weekly_discount() {
    let (engine, _db) = engine_with_db().await;
    let root = admin(&engine).await;
    let alice = customer(&engine, "alice").await;
    let panda = car(&engine, root.id, "AA000AA").await;

    let price = engine
        .quote_booking(
            alice.id,
            request(panda.id, date(2026, 5, 10), date(2026, 5, 17)),
            now(),
        )
        .await
        .unwrap();
    assert_eq!(price.days, 7);
    assert_eq!(price.base_minor, 70_000);
    assert_eq!(price.duration_discount_minor, 7_000);
    assert_eq!(price.tax_minor, 11_340);
    assert_eq!(price.total_minor, 74_340);

    // quoting reserves nothing
    assert!(
        engine
            .bookings_for_user(alice.id, None)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn booking_dates_are_validated() {
    let (engine, _db) = engine_with_db().await;
    let root = admin(&engine).await;
    let alice = customer(&engine, "alice").await;
    let panda = car(&engine, root.id, "AA000AA").await;

    let err = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 4, 30), date(2026, 5, 2)),
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDates(_)));

    let err = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 5, 10), date(2026, 8, 10)),
            now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidDates(_)));
}

#[tokio::test]
async fn paid_booking_cancelled_late_pays_fee() {
    let (engine, _db) = engine_with_db().await;
    let root = admin(&engine).await;
    let alice = customer(&engine, "alice").await;
    let bob = customer(&engine, "bob").await;
    let panda = car(&engine, root.id, "AA000AA").await;
    let booking = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 5, 10), date(2026, 5, 13)),
            now(),
        )
        .await
        .unwrap();

    let err = engine
        .confirm_payment(alice.id, booking.id, "   ", now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
    let err = engine
        .confirm_payment(bob.id, booking.id, "pay_123", now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    let confirmed = engine
        .confirm_payment(alice.id, booking.id, "pay_123", now())
        .await
        .unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.paid_minor(), 35_400);

    let err = engine
        .confirm_payment(alice.id, booking.id, "pay_123", now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    // 36 hours before pick-up
    let when = at(2026, 5, 8, 12);
    let quote = engine
        .cancellation_quote(alice.id, booking.id, when)
        .await
        .unwrap();
    assert_eq!(
        quote,
        CancellationQuote {
            fee_minor: 8_850,
            refund_minor: 26_550,
            credit_restored_minor: 0,
        }
    );

    let cancelled = engine.cancel_booking(alice.id, booking.id, when).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancellation_fee_minor, 8_850);
    assert_eq!(cancelled.refund_minor, 26_550);
    assert_eq!(cancelled.cancelled_at, Some(when));

    let window = period(date(2026, 5, 10), date(2026, 5, 13));
    assert!(engine.is_car_available(panda.id, window).await.unwrap());

    let err = engine
        .cancel_booking(alice.id, booking.id, when)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn cancellation_fee_grows_near_pickup() {
    let (engine, _db) = engine_with_db().await;
    let root = admin(&engine).await;
    let alice = customer(&engine, "alice").await;
    let panda = car(&engine, root.id, "AA000AA").await;
    let booking = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 5, 10), date(2026, 5, 13)),
            now(),
        )
        .await
        .unwrap();

    let free = engine
        .cancellation_quote(alice.id, booking.id, now())
        .await
        .unwrap();
    assert_eq!(free, CancellationQuote::default());

    engine
        .confirm_payment(alice.id, booking.id, "pay_123", now())
        .await
        .unwrap();

    let early = engine
        .cancellation_quote(alice.id, booking.id, now())
        .await
        .unwrap();
    assert_eq!(early.fee_minor, 0);
    assert_eq!(early.refund_minor, 35_400);

    let last_minute = engine
        .cancellation_quote(alice.id, booking.id, at(2026, 5, 9, 12))
        .await
        .unwrap();
    assert_eq!(last_minute.fee_minor, 17_700);
    assert_eq!(last_minute.refund_minor, 17_700);

    let err = engine
        .cancellation_quote(alice.id, booking.id, at(2026, 5, 10, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn rental_lifecycle_is_enforced() {
    let (engine, _db) = engine_with_db().await;
    let root = admin(&engine).await;
    let alice = customer(&engine, "alice").await;
    let panda = car(&engine, root.id, "AA000AA").await;
    let booking = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 5, 10), date(2026, 5, 13)),
            now(),
        )
        .await
        .unwrap();

    let err = engine
        .start_rental(root.id, booking.id, at(2026, 5, 10, 8))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidState("booking cannot move from pending to active".to_string())
    );
    let err = engine
        .complete_rental(root.id, booking.id, now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    engine
        .confirm_payment(alice.id, booking.id, "pay_123", now())
        .await
        .unwrap();

    let err = engine
        .start_rental(root.id, booking.id, at(2026, 5, 9, 18))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
    let err = engine
        .start_rental(alice.id, booking.id, at(2026, 5, 10, 8))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let active = engine
        .start_rental(root.id, booking.id, at(2026, 5, 10, 8))
        .await
        .unwrap();
    assert_eq!(active.status, BookingStatus::Active);

    let err = engine
        .cancel_booking(alice.id, booking.id, at(2026, 5, 11, 8))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));

    let completed = engine
        .complete_rental(root.id, booking.id, at(2026, 5, 13, 9))
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let err = engine
        .admin_cancel_booking(root.id, booking.id, at(2026, 5, 13, 10))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState(_)));
}

#[tokio::test]
async fn admin_cancel_waives_fee_on_active_rental() {
    let (engine, _db) = engine_with_db().await;
    let root = admin(&engine).await;
    let alice = customer(&engine, "alice").await;
    let panda = car(&engine, root.id, "AA000AA").await;
    let booking = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 5, 10), date(2026, 5, 13)),
            now(),
        )
        .await
        .unwrap();
    engine
        .confirm_payment(alice.id, booking.id, "pay_123", now())
        .await
        .unwrap();
    engine
        .start_rental(root.id, booking.id, at(2026, 5, 10, 8))
        .await
        .unwrap();

    let cancelled = engine
        .admin_cancel_booking(root.id, booking.id, at(2026, 5, 11, 8))
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.cancellation_fee_minor, 0);
    assert_eq!(cancelled.refund_minor, 35_400);
}

#[tokio::test]
async fn bookings_are_private_to_owner_and_admins() {
    let (engine, _db) = engine_with_db().await;
    let root = admin(&engine).await;
    let alice = customer(&engine, "alice").await;
    let bob = customer(&engine, "bob").await;
    let panda = car(&engine, root.id, "AA000AA").await;
    let first = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 5, 10), date(2026, 5, 13)),
            now(),
        )
        .await
        .unwrap();
    let second = engine
        .create_booking(
            alice.id,
            request(panda.id, date(2026, 6, 1), date(2026, 6, 3)),
            now(),
        )
        .await
        .unwrap();
    engine
        .confirm_payment(alice.id, second.id, "pay_456", now())
        .await
        .unwrap();

    let err = engine.booking(bob.id, first.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
    assert_eq!(engine.booking(root.id, first.id).await.unwrap().id, first.id);
    assert_eq!(engine.booking(alice.id, first.id).await.unwrap().id, first.id);

    let mine = engine.bookings_for_user(alice.id, None).await.unwrap();
    assert_eq!(
        mine.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![second.id, first.id]
    );
    let confirmed = engine
        .bookings_for_user(alice.id, Some(BookingStatus::Confirmed))
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].id, second.id);

    let err = engine
        .list_bookings(alice.id, BookingFilter::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
    let may = engine
        .list_bookings(
            root.id,
            BookingFilter {
                from: Some(date(2026, 5, 1)),
                to: Some(date(2026, 5, 31)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(may.len(), 1);
    assert_eq!(may[0].id, first.id);
}
