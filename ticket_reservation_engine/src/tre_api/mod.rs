//! # Reservation engine public API
//!
//! The `tre_api` module exposes the programmatic API for the reservation engine. It is modular so that clients can
//! pick only the functionality they need:
//!
//! * [`reservation_api`] handles the hold lifecycle: claiming seats, releasing them, extending the window, reading
//!   availability, and running the expiry sweep.
//! * [`confirmation_api`] turns paid-for reservations into bookings and serves receipt lookups.
//!
//! The pattern for both APIs is the same: an API instance is created by supplying a database backend that implements
//! the backend traits the API requires.
//!
//! ```rust,ignore
//! use ticket_reservation_engine::{ReservationApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! let api = ReservationApi::new(db, producers);
//! let report = api.availability(&show_id).await?;
//! ```

pub mod confirmation_api;
pub mod errors;
pub mod reservation_api;
pub mod reservation_objects;
