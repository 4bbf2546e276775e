use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::Duration;
use futures_util::future::join_all;
use log::*;
use ticket_reservation_engine::{
    db_types::{HoldRequest, NewBooking, SeatId, SeatStatus, ShowId},
    events::{EventHandlers, EventHooks, EventProducers},
    helpers::new_session_token,
    test_utils::{prepare_test_env, random_db_path, seed_show},
    ConfirmationApi, ConfirmationError, ReservationApi, SqliteDatabase,
};
use tokio::runtime::Runtime;
use trs_common::Money;

#[test]
fn holds_convert_into_a_booking() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 3, Money::from(4500)).await;
        let reservations = ReservationApi::new(db.clone(), EventProducers::default());
        let confirmations = ConfirmationApi::new(db, EventProducers::default());

        let token = new_session_token();
        let request = HoldRequest::new(
            ShowId::from("gala"),
            vec![SeatId::from("gala:Stalls:A1"), SeatId::from("gala:Stalls:A2")],
            token.clone(),
            Duration::seconds(600),
        );
        reservations.create_holds(request).await.expect("holds should succeed");

        let booking = confirmations
            .confirm_reservation(NewBooking::new(
                token,
                "pay_0001".to_string(),
                "alice@example.com".to_string(),
                "Alice".to_string(),
            ))
            .await
            .expect("confirmation should succeed");

        assert_eq!(booking.total_amount, Money::from(9000));
        assert_eq!(booking.seats.len(), 2);
        assert_eq!(booking.payment_reference, "pay_0001");
        assert_eq!(booking.validation_code.len(), 9);
        assert!(booking.booking_id.as_str().starts_with("bk_"));

        let found = confirmations.lookup_booking("pay_0001").await.expect("lookup should succeed");
        assert_eq!(found.expect("booking should exist").booking_id, booking.booking_id);

        let report = reservations.availability(&ShowId::from("gala")).await.expect("availability should succeed");
        let sold = report.seats.iter().filter(|s| s.status == SeatStatus::Sold).count();
        assert_eq!(sold, 2);
        let available = report.seats.iter().filter(|s| s.status == SeatStatus::Available).count();
        assert_eq!(available, 1);
    });
}

#[test]
fn duplicate_confirmations_return_the_same_booking() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let reservations = ReservationApi::new(db.clone(), EventProducers::default());
        let confirmations = ConfirmationApi::new(db, EventProducers::default());

        let token = new_session_token();
        let request = HoldRequest::new(
            ShowId::from("gala"),
            vec![SeatId::from("gala:Stalls:A1")],
            token.clone(),
            Duration::seconds(600),
        );
        reservations.create_holds(request).await.expect("holds should succeed");

        let booking = NewBooking::new(
            token,
            "pay_0002".to_string(),
            "bob@example.com".to_string(),
            "Bob".to_string(),
        );
        let first = confirmations.confirm_reservation(booking.clone()).await.expect("first confirmation");
        let second = confirmations.confirm_reservation(booking).await.expect("second confirmation");
        assert_eq!(first.booking_id, second.booking_id);
        assert_eq!(first.validation_code, second.validation_code);
    });
}

#[test]
fn concurrent_duplicate_confirmations_agree() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 25).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let reservations = ReservationApi::new(db.clone(), EventProducers::default());

        let token = new_session_token();
        let request = HoldRequest::new(
            ShowId::from("gala"),
            vec![SeatId::from("gala:Stalls:A1")],
            token.clone(),
            Duration::seconds(600),
        );
        reservations.create_holds(request).await.expect("holds should succeed");

        info!("🚀️ Delivering the same payment outcome 10 times at once");
        let deliveries = (0..10).map(|_| {
            let db = db.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let api = ConfirmationApi::new(db, EventProducers::default());
                api.confirm_reservation(NewBooking::new(
                    token,
                    "pay_0003".to_string(),
                    "carol@example.com".to_string(),
                    "Carol".to_string(),
                ))
                .await
            })
        });
        let outcomes = join_all(deliveries).await;
        let mut ids = Vec::new();
        for outcome in outcomes {
            let booking = outcome.expect("confirmation task panicked").expect("confirmation should succeed");
            ids.push(booking.booking_id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1, "every delivery must resolve to the same booking");
    });
}

#[test]
fn booking_confirmed_hook_fires_exactly_once() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;

        let fired = Arc::new(AtomicU64::new(0));
        let counter = fired.clone();
        let mut hooks = EventHooks::default();
        hooks.on_booking_confirmed(move |ev| {
            let counter = counter.clone();
            Box::pin(async move {
                debug!("Hook saw booking {}", ev.booking.booking_id);
                counter.fetch_add(1, Ordering::SeqCst);
            }) as Pin<Box<dyn Future<Output = ()> + Send>>
        });
        let handlers = EventHandlers::new(10, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;

        let reservations = ReservationApi::new(db.clone(), EventProducers::default());
        let confirmations = ConfirmationApi::new(db, producers);

        let token = new_session_token();
        let request = HoldRequest::new(
            ShowId::from("gala"),
            vec![SeatId::from("gala:Stalls:A1")],
            token.clone(),
            Duration::seconds(600),
        );
        reservations.create_holds(request).await.expect("holds should succeed");

        let booking = NewBooking::new(
            token,
            "pay_0004".to_string(),
            "dave@example.com".to_string(),
            "Dave".to_string(),
        );
        confirmations.confirm_reservation(booking.clone()).await.expect("first confirmation");
        confirmations.confirm_reservation(booking).await.expect("second confirmation");

        tokio::time::sleep(std::time::Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1, "duplicate deliveries must not re-fire the hook");
    });
}

#[test]
fn payment_after_expiry_is_escalated() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let reservations = ReservationApi::new(db.clone(), EventProducers::default());
        let confirmations = ConfirmationApi::new(db, EventProducers::default());

        let token = new_session_token();
        let request = HoldRequest::new(
            ShowId::from("gala"),
            vec![SeatId::from("gala:Stalls:A1")],
            token.clone(),
            Duration::seconds(1),
        );
        reservations.create_holds(request).await.expect("holds should succeed");
        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

        let booking = NewBooking::new(
            token,
            "pay_0005".to_string(),
            "eve@example.com".to_string(),
            "Eve".to_string(),
        );
        assert!(matches!(
            confirmations.confirm_reservation(booking).await,
            Err(ConfirmationError::ReservationExpired)
        ));
    });
}
