use chrono::Duration;
use ticket_reservation_engine::{
    db_types::{HoldRequest, NewBooking, SeatId, SeatStatus, ShowId},
    events::EventProducers,
    helpers::new_session_token,
    test_utils::{prepare_test_env, random_db_path, seed_show},
    ConfirmationApi, ReservationApi, ReservationError, SqliteDatabase,
};
use tokio::runtime::Runtime;
use trs_common::Money;

fn one_seat_request(token: &ticket_reservation_engine::db_types::SessionToken, ttl: Duration) -> HoldRequest {
    HoldRequest::new(ShowId::from("gala"), vec![SeatId::from("gala:Stalls:A1")], token.clone(), ttl)
}

#[test]
fn the_sweep_releases_lapsed_holds() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let api = ReservationApi::new(db, EventProducers::default());

        let token = new_session_token();
        api.create_holds(one_seat_request(&token, Duration::seconds(1))).await.expect("hold should succeed");
        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

        let swept = api.expire_old_holds().await.expect("sweep should succeed");
        assert_eq!(swept.released_count(), 1);

        let report = api.availability(&ShowId::from("gala")).await.expect("availability should succeed");
        assert_eq!(report.seats[0].status, SeatStatus::Available);

        // And the seat can be claimed again.
        api.create_holds(one_seat_request(&new_session_token(), Duration::seconds(600)))
            .await
            .expect("re-hold should succeed");

        // The spent session no longer has anything to report.
        assert!(api.active_holds(&token).await.expect("lookup should succeed").is_empty());
    });
}

#[test]
fn a_lapsed_hold_does_not_block_a_new_claim_before_the_sweep() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let api = ReservationApi::new(db, EventProducers::default());

        api.create_holds(one_seat_request(&new_session_token(), Duration::seconds(1)))
            .await
            .expect("hold should succeed");
        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

        // No sweep has run, but the lapsed hold must count as free.
        api.create_holds(one_seat_request(&new_session_token(), Duration::seconds(600)))
            .await
            .expect("a lapsed hold must not block a fresh claim");
    });
}

#[test]
fn confirmed_holds_are_never_reaped() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let reservations = ReservationApi::new(db.clone(), EventProducers::default());
        let confirmations = ConfirmationApi::new(db, EventProducers::default());

        let token = new_session_token();
        reservations.create_holds(one_seat_request(&token, Duration::seconds(1))).await.expect("hold should succeed");
        confirmations
            .confirm_reservation(NewBooking::new(
                token,
                "pay_1001".to_string(),
                "frank@example.com".to_string(),
                "Frank".to_string(),
            ))
            .await
            .expect("confirmation should succeed");

        tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
        let swept = reservations.expire_old_holds().await.expect("sweep should succeed");
        assert_eq!(swept.released_count(), 0, "a confirmed hold is out of the reaper's reach");

        let report = reservations.availability(&ShowId::from("gala")).await.expect("availability should succeed");
        assert_eq!(report.seats[0].status, SeatStatus::Sold);
    });
}

#[test]
fn cancellation_is_idempotent() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let api = ReservationApi::new(db, EventProducers::default());

        let token = new_session_token();
        api.create_holds(one_seat_request(&token, Duration::seconds(600))).await.expect("hold should succeed");

        let released = api.cancel_holds(&token).await.expect("cancel should succeed");
        assert_eq!(released.len(), 1);
        let released_again = api.cancel_holds(&token).await.expect("second cancel should succeed");
        assert!(released_again.is_empty());

        let report = api.availability(&ShowId::from("gala")).await.expect("availability should succeed");
        assert_eq!(report.seats[0].status, SeatStatus::Available);
    });
}

#[test]
fn extension_pushes_the_expiry_window_out() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let api = ReservationApi::new(db, EventProducers::default());

        let token = new_session_token();
        let holds =
            api.create_holds(one_seat_request(&token, Duration::seconds(600))).await.expect("hold should succeed");
        let original_expiry = holds[0].expires_at;

        let extended = api.extend_holds(&token, Duration::seconds(120)).await.expect("extend should succeed");
        assert_eq!(extended.len(), 1);
        assert_eq!(extended[0].expires_at, original_expiry + Duration::seconds(120));

        assert!(matches!(
            api.extend_holds(&new_session_token(), Duration::seconds(120)).await,
            Err(ReservationError::HoldNotFound)
        ));
    });
}
