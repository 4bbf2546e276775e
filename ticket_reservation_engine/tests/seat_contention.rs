use chrono::Duration;
use futures_util::future::join_all;
use log::*;
use ticket_reservation_engine::{
    db_types::{HoldRequest, SeatId, SeatStatus, ShowId},
    events::EventProducers,
    helpers::new_session_token,
    test_utils::{prepare_test_env, random_db_path, seed_show},
    ReservationApi, ReservationError, SqliteDatabase,
};
use tokio::runtime::Runtime;
use trs_common::Money;

const NUM_RIVALS: usize = 50;

#[test]
fn one_winner_per_seat_under_contention() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 25).await.expect("Error creating database");
        seed_show(&db, "gala", 1, Money::from(4500)).await;
        let seat = SeatId::from("gala:Stalls:A1");

        info!("🚀️ Unleashing {NUM_RIVALS} rival sessions on one seat");
        let attempts = (0..NUM_RIVALS).map(|_| {
            let db = db.clone();
            let seat = seat.clone();
            tokio::spawn(async move {
                let api = ReservationApi::new(db, EventProducers::default());
                let request = HoldRequest::new(
                    ShowId::from("gala"),
                    vec![seat],
                    new_session_token(),
                    Duration::seconds(600),
                );
                api.create_holds(request).await
            })
        });
        let outcomes = join_all(attempts).await;

        let mut winners = 0;
        for outcome in outcomes {
            match outcome.expect("reservation task panicked") {
                Ok(holds) => {
                    assert_eq!(holds.len(), 1);
                    winners += 1;
                },
                Err(ReservationError::SeatsUnavailable(seats)) => assert_eq!(seats, vec![seat.clone()]),
                Err(e) => panic!("Unexpected error: {e}"),
            }
        }
        assert_eq!(winners, 1, "exactly one session should win the seat");
    });
}

#[test]
fn batch_holds_are_all_or_nothing() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 3, Money::from(4500)).await;
        let api = ReservationApi::new(db, EventProducers::default());
        let show = ShowId::from("gala");

        // A rival grabs the middle seat first.
        let rival = HoldRequest::new(
            show.clone(),
            vec![SeatId::from("gala:Stalls:A2")],
            new_session_token(),
            Duration::seconds(600),
        );
        api.create_holds(rival).await.expect("rival hold should succeed");

        let batch = HoldRequest::new(
            show.clone(),
            vec![SeatId::from("gala:Stalls:A1"), SeatId::from("gala:Stalls:A2"), SeatId::from("gala:Stalls:A3")],
            new_session_token(),
            Duration::seconds(600),
        );
        match api.create_holds(batch).await {
            Err(ReservationError::SeatsUnavailable(seats)) => {
                assert_eq!(seats, vec![SeatId::from("gala:Stalls:A2")]);
            },
            other => panic!("Expected a seat conflict, got {other:?}"),
        }

        // The failed batch must not have claimed the free seats.
        let report = api.availability(&show).await.expect("availability should succeed");
        let status_of = |id: &str| {
            report.seats.iter().find(|s| s.seat_id.as_str() == id).map(|s| s.status).expect("seat missing from report")
        };
        assert_eq!(status_of("gala:Stalls:A1"), SeatStatus::Available);
        assert_eq!(status_of("gala:Stalls:A2"), SeatStatus::Held);
        assert_eq!(status_of("gala:Stalls:A3"), SeatStatus::Available);
    });
}

#[test]
fn unknown_seats_and_foreign_shows_are_rejected() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
        seed_show(&db, "gala", 2, Money::from(4500)).await;
        seed_show(&db, "matinee", 2, Money::from(1500)).await;
        let api = ReservationApi::new(db, EventProducers::default());

        let missing = HoldRequest::new(
            ShowId::from("gala"),
            vec![SeatId::from("gala:Stalls:A1"), SeatId::from("gala:Stalls:Z99")],
            new_session_token(),
            Duration::seconds(600),
        );
        match api.create_holds(missing).await {
            Err(ReservationError::SeatNotFound(seats)) => assert_eq!(seats, vec![SeatId::from("gala:Stalls:Z99")]),
            other => panic!("Expected unknown seats, got {other:?}"),
        }

        let mixed = HoldRequest::new(
            ShowId::from("gala"),
            vec![SeatId::from("gala:Stalls:A1"), SeatId::from("matinee:Stalls:A1")],
            new_session_token(),
            Duration::seconds(600),
        );
        assert!(matches!(api.create_holds(mixed).await, Err(ReservationError::MixedShows(_))));

        let empty =
            HoldRequest::new(ShowId::from("gala"), vec![], new_session_token(), Duration::seconds(600));
        assert!(matches!(api.create_holds(empty).await, Err(ReservationError::EmptySelection)));

        let no_show = HoldRequest::new(
            ShowId::from("does-not-exist"),
            vec![SeatId::from("gala:Stalls:A1")],
            new_session_token(),
            Duration::seconds(600),
        );
        assert!(matches!(api.create_holds(no_show).await, Err(ReservationError::ShowNotFound(_))));
    });
}
