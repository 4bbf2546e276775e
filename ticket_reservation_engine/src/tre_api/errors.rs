use thiserror::Error;

use crate::db_types::{SeatId, ShowId};

#[derive(Debug, Clone, Error)]
pub enum ReservationError {
    #[error("No seats were requested")]
    EmptySelection,
    #[error("Show {0} does not exist")]
    ShowNotFound(ShowId),
    #[error("These seats do not exist: {0:?}")]
    SeatNotFound(Vec<SeatId>),
    #[error("The requested seats do not all belong to show {0}")]
    MixedShows(ShowId),
    #[error("These seats are not available: {0:?}")]
    SeatsUnavailable(Vec<SeatId>),
    #[error("No active reservation exists for this session")]
    HoldNotFound,
    #[error("Internal database error: {0}")]
    DatabaseError(String),
}

#[derive(Debug, Clone, Error)]
pub enum ConfirmationError {
    /// The hold window lapsed before payment completed. The caller holds a confirmed payment for seats the engine no
    /// longer guarantees, which requires human follow-up (a refund or a re-seat).
    #[error("The reservation expired before the payment was confirmed")]
    ReservationExpired,
    #[error("Internal database error: {0}")]
    PersistenceFailure(String),
}
