use crate::db_types::{SeatAvailability, ShowId};

/// Derives the real-time availability of every seat in a show by combining inventory with ledger and booking state.
#[allow(async_fn_in_trait)]
pub trait AvailabilityView: Clone {
    type Error: std::error::Error;

    /// Computes the status of every seat in one consistent snapshot: `Sold` if the seat belongs to a non-cancelled
    /// booking, otherwise `Held` if it has an active, unexpired hold, otherwise `Available`.
    async fn seat_availability(&self, show_id: &ShowId) -> Result<Vec<SeatAvailability>, Self::Error>;
}
