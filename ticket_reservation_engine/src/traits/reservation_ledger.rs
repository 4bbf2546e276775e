use chrono::{DateTime, Duration, Utc};

use crate::{
    db_types::{Hold, HoldRequest, SessionToken},
    traits::InsertHoldsResult,
};

/// The concurrency-critical core of the engine: time-bounded, seat-exclusive holds.
///
/// Implementations must uphold two guarantees with durable storage primitives (not in-process locks, which do not
/// survive multiple server instances):
/// * at most one `Active` hold exists per seat at any instant, and
/// * a batch hold request is atomic: either every requested seat is claimed or none are.
#[allow(async_fn_in_trait)]
pub trait ReservationLedger: Clone {
    type Error: std::error::Error;

    /// Attempts to claim every seat in the request for the given session token. Seat ids are deduplicated and locked
    /// in sorted order so that two requests over overlapping seat sets cannot deadlock. A seat whose previous hold
    /// has lapsed but not yet been reaped counts as free.
    async fn create_holds(&self, request: HoldRequest) -> Result<InsertHoldsResult, Self::Error>;

    /// Marks all active holds for the token as `Cancelled` and returns them. Cancelling a token with no active holds
    /// is a no-op that returns an empty list, so the operation is idempotent.
    async fn cancel_holds(&self, token: &SessionToken) -> Result<Vec<Hold>, Self::Error>;

    /// Pushes `expires_at` forward by `additional` for all active holds under the token. Returns `None` if no active
    /// holds remain (already expired, cancelled or confirmed).
    async fn extend_holds(&self, token: &SessionToken, additional: Duration) -> Result<Option<Vec<Hold>>, Self::Error>;

    async fn active_holds_for_session(&self, token: &SessionToken) -> Result<Vec<Hold>, Self::Error>;

    /// The reaper's sweep: transitions every hold that is still `Active` with `expires_at <= now` to `Expired` and
    /// returns the reaped holds. The status check and the transition are a single compare-and-set, so a hold that is
    /// concurrently confirmed is never expired.
    async fn expire_overdue_holds(&self, now: DateTime<Utc>) -> Result<Vec<Hold>, Self::Error>;
}
