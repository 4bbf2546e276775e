use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use ticket_reservation_engine::{events::EventProducers, ConfirmationApi, ReservationApi, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    gateway::RedirectGateway,
    routes::{
        health,
        AvailabilityRoute,
        BookingByIdRoute,
        BookingByReferenceRoute,
        CancelReservationRoute,
        ExtendReservationRoute,
        ReserveRoute,
    },
    webhook_routes::PaymentOutcomeRoute,
};

pub async fn run_server(config: ServerConfig, producers: EventProducers) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let _reaper = start_expiry_worker(db.clone(), producers.clone(), config.sweep_interval);
    let srv = create_server_instance(config, db, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let reservations_api = ReservationApi::new(db.clone(), producers.clone());
        let confirmations_api = ConfirmationApi::new(db.clone(), producers.clone());
        let gateway = RedirectGateway::new(config.gateway.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("trs::access_log"))
            .app_data(web::Data::new(reservations_api))
            .app_data(web::Data::new(confirmations_api))
            .app_data(web::Data::new(gateway))
            .app_data(web::Data::new(config.clone()))
            .service(health)
            .service(AvailabilityRoute::<SqliteDatabase>::new())
            .service(ReserveRoute::<SqliteDatabase>::new())
            .service(CancelReservationRoute::<SqliteDatabase>::new())
            .service(ExtendReservationRoute::<SqliteDatabase>::new())
            .service(BookingByReferenceRoute::<SqliteDatabase>::new())
            .service(BookingByIdRoute::<SqliteDatabase>::new())
            .service(PaymentOutcomeRoute::<SqliteDatabase, SqliteDatabase>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
