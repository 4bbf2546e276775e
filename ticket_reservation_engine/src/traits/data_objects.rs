use crate::db_types::{Booking, Hold, SeatId};

/// The outcome of a batch hold request. The batch is atomic: anything other than `Created` means no hold was
/// written at all.
#[derive(Debug, Clone)]
pub enum InsertHoldsResult {
    /// Every requested seat was claimed. One hold per seat, all sharing the session token and expiry.
    Created(Vec<Hold>),
    /// One or more seats are actively held or already sold. Carries the conflicting seat ids so the client can
    /// re-render availability.
    Conflict(Vec<SeatId>),
    /// One or more of the requested seat ids do not exist.
    UnknownSeats(Vec<SeatId>),
    /// The requested seats do not all belong to the requested show.
    MixedShows,
}

/// The outcome of a confirmation attempt.
#[derive(Debug, Clone)]
pub enum ConfirmResult {
    /// A new booking was created and the session's holds transitioned to `Confirmed`.
    Confirmed(Booking),
    /// A booking already existed for this payment reference or session token. Confirmation is idempotent, so this is
    /// a success from the caller's perspective; the existing booking is returned unchanged.
    AlreadyConfirmed(Booking),
    /// No active holds remain for the session and no booking exists. The hold window lapsed before confirmation.
    NoActiveHolds,
}
