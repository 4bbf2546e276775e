//! Server configuration.
//!
//! Everything is read from environment variables (a `.env` file is honoured via `dotenvy` in `main`):
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `TRS_HOST` | Interface to bind | `127.0.0.1` |
//! | `TRS_PORT` | Port to bind | `8360` |
//! | `TRS_DATABASE_URL` | SQLite database URL | none (must be set) |
//! | `TRS_HOLD_TTL_SECS` | How long a new hold lasts | `600` |
//! | `TRS_SWEEP_INTERVAL_SECS` | How often the reaper sweeps | `30` |
//! | `TRS_GATEWAY_CHECKOUT_URL` | Base URL buyers are redirected to for payment | `https://pay.invalid/checkout` |
//! | `TRS_GATEWAY_WEBHOOK_SECRET` | Shared secret the gateway sends with webhooks | none |
//! | `TRS_DISABLE_WEBHOOK_AUTH` | Skip webhook secret checks (tests only) | `false` |
use std::env;

use chrono::Duration;
use log::*;
use trs_common::{parse_boolean_flag, Secret};

const DEFAULT_TRS_HOST: &str = "127.0.0.1";
const DEFAULT_TRS_PORT: u16 = 8360;
const DEFAULT_HOLD_TTL: Duration = Duration::seconds(600);
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::seconds(30);
const DEFAULT_CHECKOUT_URL: &str = "https://pay.invalid/checkout";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How long a freshly created hold lasts before the reaper may release it.
    pub hold_ttl: Duration,
    /// How often the expiry worker sweeps for lapsed holds.
    pub sweep_interval: Duration,
    pub gateway: GatewayConfig,
}

#[derive(Clone, Debug, Default)]
pub struct GatewayConfig {
    /// The base URL buyers are redirected to in order to complete payment.
    pub checkout_url: String,
    /// Shared secret the gateway attaches to webhook deliveries in the `x-trs-webhook-token` header.
    pub webhook_secret: Secret<String>,
    /// When true, webhook deliveries are accepted without the shared secret. Only ever useful in tests.
    pub disable_webhook_auth: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TRS_HOST.to_string(),
            port: DEFAULT_TRS_PORT,
            database_url: String::default(),
            hold_ttl: DEFAULT_HOLD_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TRS_HOST").ok().unwrap_or_else(|| DEFAULT_TRS_HOST.into());
        let port = env::var("TRS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TRS_PORT. {e} Using the default, {DEFAULT_TRS_PORT}, instead."
                    );
                    DEFAULT_TRS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TRS_PORT);
        let database_url = env::var("TRS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TRS_DATABASE_URL is not set. Please set it to the URL for the reservation database.");
            String::default()
        });
        let hold_ttl = duration_from_env("TRS_HOLD_TTL_SECS", DEFAULT_HOLD_TTL);
        let sweep_interval = duration_from_env("TRS_SWEEP_INTERVAL_SECS", DEFAULT_SWEEP_INTERVAL);
        let gateway = GatewayConfig::from_env_or_default();
        Self { host, port, database_url, hold_ttl, sweep_interval, gateway }
    }
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let checkout_url = env::var("TRS_GATEWAY_CHECKOUT_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ TRS_GATEWAY_CHECKOUT_URL is not set. Using a placeholder that will not serve real checkouts.");
            DEFAULT_CHECKOUT_URL.to_string()
        });
        let webhook_secret = env::var("TRS_GATEWAY_WEBHOOK_SECRET").ok().unwrap_or_else(|| {
            error!(
                "🪛️ TRS_GATEWAY_WEBHOOK_SECRET is not set. Webhook deliveries cannot be authenticated and will all \
                 be rejected."
            );
            String::default()
        });
        let disable_webhook_auth = parse_boolean_flag(env::var("TRS_DISABLE_WEBHOOK_AUTH").ok(), false);
        if disable_webhook_auth {
            warn!("🚨️ Webhook authentication is DISABLED. Anyone can confirm bookings. Never do this in production.");
        }
        Self { checkout_url, webhook_secret: Secret::new(webhook_secret), disable_webhook_auth }
    }
}

fn duration_from_env(var: &str, default: Duration) -> Duration {
    env::var(var)
        .ok()
        .map(|s| match s.parse::<i64>() {
            Ok(secs) if secs > 0 => Duration::seconds(secs),
            _ => {
                error!("🪛️ {s} is not a valid number of seconds for {var}. Using the default, {default}.");
                default
            },
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn durations_fall_back_to_defaults() {
        env::remove_var("TRS_TEST_DURATION");
        assert_eq!(duration_from_env("TRS_TEST_DURATION", DEFAULT_HOLD_TTL), DEFAULT_HOLD_TTL);
        env::set_var("TRS_TEST_DURATION", "90");
        assert_eq!(duration_from_env("TRS_TEST_DURATION", DEFAULT_HOLD_TTL), Duration::seconds(90));
        env::set_var("TRS_TEST_DURATION", "not-a-number");
        assert_eq!(duration_from_env("TRS_TEST_DURATION", DEFAULT_HOLD_TTL), DEFAULT_HOLD_TTL);
        env::remove_var("TRS_TEST_DURATION");
    }
}
