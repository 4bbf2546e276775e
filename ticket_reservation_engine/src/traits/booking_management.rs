use crate::{
    db_types::{Booking, BookingId, NewBooking},
    traits::ConfirmResult,
};

/// Converts reservations into durable bookings once payment is verified, and serves receipt lookups.
///
/// The central contract is idempotency on the payment reference: confirming the same payment twice must return the
/// same booking, backed by a durable uniqueness constraint rather than any in-memory dedup cache.
#[allow(async_fn_in_trait)]
pub trait BookingManagement: Clone {
    type Error: std::error::Error;

    /// In a single atomic transaction: transitions the session's active holds to `Confirmed`, sums the prices that
    /// were snapshotted at hold time, and persists the booking with its per-seat price records. See [`ConfirmResult`]
    /// for the idempotent outcomes. This is purely a state transition; no payment-provider calls happen here.
    async fn confirm_reservation(&self, request: NewBooking) -> Result<ConfirmResult, Self::Error>;

    async fn fetch_booking_by_payment_reference(&self, reference: &str) -> Result<Option<Booking>, Self::Error>;

    async fn fetch_booking_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, Self::Error>;
}
