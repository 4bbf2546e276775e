//! Payment gateway adapter.
//!
//! The engine never talks to a payment provider directly. The server creates a payment session with the gateway when
//! a reservation is placed, redirects the buyer there, and later receives the outcome on the webhook route. This
//! module defines the adapter seam and the default redirect-based implementation.

use chrono::{DateTime, Utc};
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ticket_reservation_engine::db_types::SessionToken;
use trs_common::Money;

use crate::config::GatewayConfig;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("The payment gateway rejected the session request: {0}")]
    SessionRejected(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSessionRequest {
    pub session_token: SessionToken,
    pub amount: Money,
    pub expires_at: DateTime<Utc>,
}

/// A checkout session at the gateway. The buyer completes payment at `payment_url`; the gateway reports the outcome
/// on the webhook using `payment_session_id` as its correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    pub payment_session_id: String,
    pub payment_url: String,
}

#[allow(async_fn_in_trait)]
pub trait PaymentGateway: Clone {
    async fn create_payment_session(&self, request: PaymentSessionRequest) -> Result<PaymentSession, GatewayError>;
}

/// The default adapter: builds a redirect URL onto the configured checkout endpoint. The gateway learns the amount
/// and expiry from the query string and calls back on the webhook route when the buyer pays.
#[derive(Debug, Clone)]
pub struct RedirectGateway {
    config: GatewayConfig,
}

impl RedirectGateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }
}

impl PaymentGateway for RedirectGateway {
    async fn create_payment_session(&self, request: PaymentSessionRequest) -> Result<PaymentSession, GatewayError> {
        let suffix: String = thread_rng().sample_iter(&Alphanumeric).take(16).map(char::from).collect();
        let payment_session_id = format!("ps_{suffix}");
        let payment_url = format!(
            "{}?session={}&amount={}&expires={}",
            self.config.checkout_url,
            request.session_token,
            request.amount.value(),
            request.expires_at.timestamp(),
        );
        debug!("💳️ Created payment session {payment_session_id} for [{}]", request.session_token);
        Ok(PaymentSession { payment_session_id, payment_url })
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use trs_common::Secret;

    use super::*;

    #[tokio::test]
    async fn redirect_gateway_builds_a_checkout_url() {
        let config = GatewayConfig {
            checkout_url: "https://pay.example.com/checkout".to_string(),
            webhook_secret: Secret::new("shh".to_string()),
            disable_webhook_auth: false,
        };
        let gateway = RedirectGateway::new(config);
        let session = gateway
            .create_payment_session(PaymentSessionRequest {
                session_token: SessionToken::from("tok123"),
                amount: Money::from(9000),
                expires_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(session.payment_session_id.starts_with("ps_"));
        assert_eq!(session.payment_session_id.len(), 19);
        assert!(session.payment_url.starts_with("https://pay.example.com/checkout?session=tok123&amount=9000"));
    }
}
