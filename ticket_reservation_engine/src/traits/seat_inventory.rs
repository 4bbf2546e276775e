use crate::db_types::{NewSeat, NewShow, Seat, SeatId, Show, ShowId};

/// Read access to the seat inventory: the durable ground truth for seat identity and administered prices. Other
/// components must not duplicate or drift from this data; holds snapshot prices from here at creation time.
///
/// The store is read-heavy and only written during provisioning, so it carries no concurrency hazard of its own.
#[allow(async_fn_in_trait)]
pub trait SeatInventory: Clone {
    type Error: std::error::Error;

    async fn fetch_show(&self, show_id: &ShowId) -> Result<Option<Show>, Self::Error>;

    async fn fetch_seats_for_show(&self, show_id: &ShowId) -> Result<Vec<Seat>, Self::Error>;

    async fn fetch_seat(&self, seat_id: &SeatId) -> Result<Option<Seat>, Self::Error>;

    /// Creates a show and its seat map in a single atomic transaction. Seat ids are derived here and nowhere else;
    /// any legacy identity translation is internal to the inventory store.
    async fn provision_show(&self, show: NewShow, seats: Vec<NewSeat>) -> Result<Show, Self::Error>;
}
