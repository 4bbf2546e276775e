//! Endpoint tests run the real route handlers against a throwaway SQLite database.

use actix_web::{http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use ticket_reservation_engine::{
    events::EventProducers,
    test_utils::{prepare_test_env, random_db_path, seed_show},
    ConfirmationApi,
    ReservationApi,
    SqliteDatabase,
};
use trs_common::{Money, Secret};

use crate::{
    config::{GatewayConfig, ServerConfig},
    data_objects::ReservationResponse,
    gateway::RedirectGateway,
    routes::{health, AvailabilityRoute, BookingByReferenceRoute, CancelReservationRoute, ReserveRoute},
    webhook_routes::{PaymentOutcomeRoute, WEBHOOK_TOKEN_HEADER},
};

const WEBHOOK_SECRET: &str = "test-webhook-secret";

async fn test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    seed_show(&db, "gala", 3, Money::from(4500)).await;
    db
}

fn test_config() -> ServerConfig {
    let mut config = ServerConfig::default();
    config.gateway = GatewayConfig {
        checkout_url: "https://pay.example.com/checkout".to_string(),
        webhook_secret: Secret::new(WEBHOOK_SECRET.to_string()),
        disable_webhook_auth: false,
    };
    config
}

fn configure(db: SqliteDatabase) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let config = test_config();
        let reservations = ReservationApi::new(db.clone(), EventProducers::default());
        let confirmations = ConfirmationApi::new(db, EventProducers::default());
        let gateway = RedirectGateway::new(config.gateway.clone());
        cfg.app_data(web::Data::new(reservations))
            .app_data(web::Data::new(confirmations))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(config))
            .service(health)
            .service(AvailabilityRoute::<SqliteDatabase>::new())
            .service(ReserveRoute::<SqliteDatabase>::new())
            .service(CancelReservationRoute::<SqliteDatabase>::new())
            .service(BookingByReferenceRoute::<SqliteDatabase>::new())
            .service(PaymentOutcomeRoute::<SqliteDatabase, SqliteDatabase>::new());
    }
}

#[actix_web::test]
async fn health_check() {
    let req = TestRequest::get().uri("/health").to_request();
    let app = test::init_service(App::new().service(health)).await;
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
}

#[actix_web::test]
async fn reserve_then_availability_shows_held_seats() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let req = TestRequest::post()
        .uri("/reservations")
        .set_json(serde_json::json!({"show_id": "gala", "seat_ids": ["gala:Stalls:A1", "gala:Stalls:A2"]}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let reservation: ReservationResponse = test::read_body_json(res).await;
    assert_eq!(reservation.holds.len(), 2);
    assert_eq!(reservation.total, Money::from(9000));
    assert!(reservation.payment_url.starts_with("https://pay.example.com/checkout?"));

    let req = TestRequest::get().uri("/shows/gala/availability").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    assert_eq!(body.matches("\"held\"").count(), 2);
    assert_eq!(body.matches("\"available\"").count(), 1);
}

#[actix_web::test]
async fn conflicting_reservation_is_a_409() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let body = serde_json::json!({"show_id": "gala", "seat_ids": ["gala:Stalls:A1"]});
    let req = TestRequest::post().uri("/reservations").set_json(body.clone()).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let req = TestRequest::post().uri("/reservations").set_json(body).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn webhook_confirms_a_paid_reservation() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;

    let req = TestRequest::post()
        .uri("/reservations")
        .set_json(serde_json::json!({"show_id": "gala", "seat_ids": ["gala:Stalls:A3"]}))
        .to_request();
    let res = test::call_service(&app, req).await;
    let reservation: ReservationResponse = test::read_body_json(res).await;

    let webhook = serde_json::json!({
        "payment_reference": "pay_e2e_01",
        "session_token": reservation.session_token,
        "amount_paid": 4500,
        "payer_email": "alice@example.com",
        "payer_name": "Alice",
        "outcome": "succeeded"
    });

    // Without the shared secret the delivery is refused.
    let req = TestRequest::post().uri("/webhook/payment_outcome").set_json(webhook.clone()).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = TestRequest::post()
        .uri("/webhook/payment_outcome")
        .insert_header((WEBHOOK_TOKEN_HEADER, WEBHOOK_SECRET))
        .set_json(webhook)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());

    let req = TestRequest::get().uri("/bookings/pay_e2e_01").to_request();
    let res = test::call_service(&app, req).await;
    assert!(res.status().is_success());
    let body = String::from_utf8_lossy(&test::read_body(res).await).into_owned();
    assert!(body.contains("gala:Stalls:A3"), "was: {body}");
}

#[actix_web::test]
async fn missing_booking_is_a_404() {
    let _ = env_logger::try_init().ok();
    let db = test_db().await;
    let app = test::init_service(App::new().configure(configure(db))).await;
    let req = TestRequest::get().uri("/bookings/pay_never_happened").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
