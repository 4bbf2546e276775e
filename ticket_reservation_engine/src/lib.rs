//! Ticket Reservation Engine
//!
//! The engine guarantees that no two customers can book the same seat, holds seats for a bounded window while a buyer
//! completes payment, and reconciles asynchronous payment outcomes with reservation state. It is the only component
//! permitted to write hold or booking records; everything else (seat-map rendering, catalog management, payment
//! provider SDKs) is a consumer of its results.
//!
//! The library is divided into three main sections:
//! 1. Database management ([`mod@db`]). SQLite is the supported backend. You should never need to access the database
//!    directly; use the public API instead. The exception is the data types used in the database, defined in the
//!    public `db_types` module.
//! 2. The backend trait family ([`mod@traits`]): `SeatInventory`, `ReservationLedger`, `AvailabilityView` and
//!    `BookingManagement`. A storage backend implements these to drive the engine.
//! 3. The public API ([`ReservationApi`] and [`ConfirmationApi`]), which enforces the reservation contracts: atomic
//!    batch holds, at most one active hold per seat, and idempotent, exactly-once booking confirmation keyed on the
//!    payment reference.
//!
//! The engine also emits events when bookings are confirmed and when stale holds are swept. A simple actor framework
//! lets you hook into these, e.g. to send confirmation emails, without coupling the engine to delivery concerns.
mod db;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;
mod tre_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use tre_api::{
    confirmation_api::ConfirmationApi,
    errors::{ConfirmationError, ReservationError},
    reservation_api::ReservationApi,
    reservation_objects,
};
