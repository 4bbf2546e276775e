use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ticket_reservation_engine::db_types::{Booking, Hold, SeatId, SessionToken, ShowId};
use trs_common::Money;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The request body for `POST /reservations`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    pub show_id: ShowId,
    pub seat_ids: Vec<SeatId>,
}

/// The response to a successful reservation: the session token for subsequent calls, the held seats, the shared
/// expiry instant, and where to go to pay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReservationResponse {
    pub session_token: SessionToken,
    pub holds: Vec<Hold>,
    pub expires_at: DateTime<Utc>,
    pub total: Money,
    pub payment_url: String,
}

/// The request body for `POST /reservations/{session_token}/extend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendRequest {
    pub additional_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// The payload the payment gateway POSTs to `/webhook/payment_outcome` when a checkout completes or fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhook {
    pub payment_reference: String,
    pub session_token: SessionToken,
    pub amount_paid: Money,
    pub payer_email: String,
    pub payer_name: String,
    pub outcome: PaymentOutcome,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub booking: Option<Booking>,
}

impl WebhookResponse {
    pub fn confirmed(booking: Booking) -> Self {
        Self { success: true, message: "Booking confirmed".to_string(), booking: Some(booking) }
    }

    pub fn released() -> Self {
        Self { success: true, message: "Reservation released".to_string(), booking: None }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string(), booking: None }
    }
}
