//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will stop
//! the current worker from processing new requests. Any long, non-cpu-bound operation (I/O, database calls) must be
//! expressed as a future or asynchronous function so that worker threads can interleave requests.
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Duration;
use log::*;
use ticket_reservation_engine::{
    db_types::{BookingId, HoldRequest, SessionToken, ShowId},
    helpers::new_session_token,
    traits::{BookingManagement, ReservationBackend},
    ConfirmationApi,
    ReservationApi,
};

use crate::{
    config::ServerConfig,
    data_objects::{ExtendRequest, JsonResponse, ReservationResponse, ReserveRequest},
    errors::ServerError,
    gateway::{PaymentGateway, PaymentSessionRequest, RedirectGateway},
};

// Actix cannot handle generics in handlers, so routes are implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------  Availability  ------------------------------------------------
route!(availability => Get "/shows/{show_id}/availability" impl ReservationBackend);
/// Returns the live status of every seat in the show in a single consistent snapshot.
pub async fn availability<B: ReservationBackend>(
    path: web::Path<String>,
    api: web::Data<ReservationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let show_id = ShowId::from(path.into_inner());
    debug!("💻️ GET availability for show [{show_id}]");
    let report = api.availability(&show_id).await?;
    Ok(HttpResponse::Ok().json(report))
}

//----------------------------------------------  Reservations  ------------------------------------------------
route!(reserve => Post "/reservations" impl ReservationBackend);
/// Places an all-or-nothing hold on the requested seats and opens a payment session with the gateway.
///
/// The response carries a freshly minted session token. The client presents it to cancel or extend the reservation;
/// the gateway echoes it back on the payment webhook so the outcome can be matched to these holds.
pub async fn reserve<B: ReservationBackend>(
    body: web::Json<ReserveRequest>,
    api: web::Data<ReservationApi<B>>,
    gateway: web::Data<RedirectGateway>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    let token = new_session_token();
    debug!("💻️ POST reservation of {} seat(s) for show [{}]", request.seat_ids.len(), request.show_id);
    let holds = api
        .create_holds(HoldRequest::new(request.show_id, request.seat_ids, token.clone(), config.hold_ttl))
        .await?;
    let total = holds.iter().map(|h| h.price).sum();
    let expires_at = holds.iter().map(|h| h.expires_at).max().unwrap_or_else(chrono::Utc::now);
    let session = gateway
        .create_payment_session(PaymentSessionRequest { session_token: token.clone(), amount: total, expires_at })
        .await
        .map_err(|e| ServerError::GatewayError(e.to_string()))?;
    let response =
        ReservationResponse { session_token: token, holds, expires_at, total, payment_url: session.payment_url };
    Ok(HttpResponse::Created().json(response))
}

route!(cancel_reservation => Delete "/reservations/{session_token}" impl ReservationBackend);
/// Releases every active hold for the session. Safe to repeat; a spent token releases nothing.
pub async fn cancel_reservation<B: ReservationBackend>(
    path: web::Path<String>,
    api: web::Data<ReservationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let token = SessionToken::from(path.into_inner());
    debug!("💻️ DELETE reservation [{token}]");
    let released = api.cancel_holds(&token).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{} hold(s) released", released.len()))))
}

route!(extend_reservation => Post "/reservations/{session_token}/extend" impl ReservationBackend);
/// Pushes the session's expiry window out by the requested number of seconds.
pub async fn extend_reservation<B: ReservationBackend>(
    path: web::Path<String>,
    body: web::Json<ExtendRequest>,
    api: web::Data<ReservationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let token = SessionToken::from(path.into_inner());
    let additional = body.into_inner().additional_seconds;
    if additional <= 0 {
        return Err(ServerError::InvalidRequestBody("additional_seconds must be positive".to_string()));
    }
    debug!("💻️ POST extend reservation [{token}] by {additional}s");
    let holds = api.extend_holds(&token, Duration::seconds(additional)).await?;
    Ok(HttpResponse::Ok().json(holds))
}

//----------------------------------------------   Bookings  ---------------------------------------------------
route!(booking_by_reference => Get "/bookings/{payment_reference}" impl BookingManagement);
/// Fetches the booking receipt for a payment reference, including its per-seat price records.
pub async fn booking_by_reference<B: BookingManagement>(
    path: web::Path<String>,
    api: web::Data<ConfirmationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let reference = path.into_inner();
    debug!("💻️ GET booking for payment [{reference}]");
    match api.lookup_booking(&reference).await? {
        Some(booking) => Ok(HttpResponse::Ok().json(booking)),
        None => Err(ServerError::NoRecordFound(format!("No booking for payment reference {reference}"))),
    }
}

route!(booking_by_id => Get "/bookings/id/{booking_id}" impl BookingManagement);
pub async fn booking_by_id<B: BookingManagement>(
    path: web::Path<String>,
    api: web::Data<ConfirmationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let booking_id = BookingId::from(path.into_inner());
    debug!("💻️ GET booking {booking_id}");
    match api.booking_by_id(&booking_id).await? {
        Some(booking) => Ok(HttpResponse::Ok().json(booking)),
        None => Err(ServerError::NoRecordFound(format!("No booking with id {booking_id}"))),
    }
}
