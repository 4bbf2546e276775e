//! The behaviour a storage backend must provide to drive the engine.
//!
//! The traits are split along the component boundaries of the system: seat inventory (ground truth for identity and
//! price), the reservation ledger (the concurrency-critical core), the availability view, and booking management.
//! All mutation of hold and booking records goes through `ReservationLedger` and `BookingManagement`; no other
//! component may write those tables.
mod availability_view;
mod booking_management;
mod data_objects;
mod reservation_ledger;
mod seat_inventory;

pub use availability_view::AvailabilityView;
pub use booking_management::BookingManagement;
pub use data_objects::{ConfirmResult, InsertHoldsResult};
pub use reservation_ledger::ReservationLedger;
pub use seat_inventory::SeatInventory;

/// Blanket alias for backends that can serve the whole reservation flow.
pub trait ReservationBackend: SeatInventory + ReservationLedger + AvailabilityView {}

impl<T> ReservationBackend for T where T: SeatInventory + ReservationLedger + AvailabilityView {}
