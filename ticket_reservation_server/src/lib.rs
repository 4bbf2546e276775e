//! # Ticket reservation server
//!
//! The HTTP face of the reservation engine. It is responsible for:
//! * serving the live seat-availability map for a show,
//! * placing, extending and releasing time-bounded holds on behalf of checkout sessions,
//! * receiving payment outcome webhooks from the payment gateway and confirming (or releasing) the reservation, and
//! * running the background reaper that sweeps lapsed holds.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod expiry_worker;
pub mod gateway;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
