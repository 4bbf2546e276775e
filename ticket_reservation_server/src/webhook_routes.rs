//! Payment gateway webhook handling.
//!
//! The gateway delivers payment outcomes at-least-once and retries on any 5xx response. The handler is therefore
//! written so that every delivery of the same outcome converges on the same state: confirmation is idempotent on the
//! payment reference, and releasing holds is idempotent on the session token. Outcomes the server can never recover
//! from by retrying (an expired reservation) are answered with a 200 and a failure body so the gateway stops
//! redelivering; genuine persistence failures return a 500 so it tries again.
use actix_web::{web, HttpRequest, HttpResponse};
use log::*;
use ticket_reservation_engine::{
    db_types::NewBooking,
    traits::{BookingManagement, ReservationBackend},
    ConfirmationApi,
    ConfirmationError,
    ReservationApi,
};

use crate::{
    config::ServerConfig,
    data_objects::{PaymentOutcome, PaymentWebhook, WebhookResponse},
    errors::ServerError,
    route,
};

pub const WEBHOOK_TOKEN_HEADER: &str = "x-trs-webhook-token";

route!(payment_outcome => Post "/webhook/payment_outcome" impl ReservationBackend, BookingManagement);
/// Receives a payment outcome from the gateway and reconciles it with the reservation state.
///
/// * `succeeded`: the session's holds become a booking. Duplicate deliveries return the same booking.
/// * `failed`: the session's holds are released immediately so the seats go back on sale.
pub async fn payment_outcome<L: ReservationBackend + 'static, B: BookingManagement + 'static>(
    req: HttpRequest,
    body: web::Json<PaymentWebhook>,
    reservations: web::Data<ReservationApi<L>>,
    confirmations: web::Data<ConfirmationApi<B>>,
    config: web::Data<ServerConfig>,
) -> Result<HttpResponse, ServerError> {
    check_webhook_token(&req, &config)?;
    let webhook = body.into_inner();
    let reference = webhook.payment_reference.clone();
    debug!("📨️ Payment outcome for [{reference}]: {:?}", webhook.outcome);
    match webhook.outcome {
        PaymentOutcome::Succeeded => {
            let booking = NewBooking::new(
                webhook.session_token,
                webhook.payment_reference,
                webhook.payer_email,
                webhook.payer_name,
            );
            match confirmations.confirm_reservation(booking).await {
                Ok(booking) => {
                    if booking.total_amount != webhook.amount_paid {
                        warn!(
                            "📨️ Payment [{reference}] paid {} but booking {} totals {}. Flagging for reconciliation.",
                            webhook.amount_paid, booking.booking_id, booking.total_amount
                        );
                    }
                    Ok(HttpResponse::Ok().json(WebhookResponse::confirmed(booking)))
                },
                // Retrying cannot resurrect an expired reservation, so acknowledge the delivery. The engine has
                // already logged the escalation.
                Err(ConfirmationError::ReservationExpired) => {
                    Ok(HttpResponse::Ok().json(WebhookResponse::failure("The reservation expired before payment")))
                },
                Err(e) => Err(e.into()),
            }
        },
        PaymentOutcome::Failed => {
            let released = reservations.cancel_holds(&webhook.session_token).await?;
            debug!("📨️ Payment [{reference}] failed. {} hold(s) released", released.len());
            Ok(HttpResponse::Ok().json(WebhookResponse::released()))
        },
    }
}

fn check_webhook_token(req: &HttpRequest, config: &ServerConfig) -> Result<(), ServerError> {
    if config.gateway.disable_webhook_auth {
        return Ok(());
    }
    let expected = config.gateway.webhook_secret.reveal().as_str();
    if expected.is_empty() {
        warn!("📨️ Rejecting webhook delivery because no webhook secret is configured");
        return Err(ServerError::WebhookAuthError);
    }
    let supplied = req.headers().get(WEBHOOK_TOKEN_HEADER).and_then(|v| v.to_str().ok());
    match supplied {
        Some(token) if token == expected => Ok(()),
        _ => {
            warn!("📨️ Webhook delivery with a missing or invalid token was rejected");
            Err(ServerError::WebhookAuthError)
        },
    }
}
