use serde::{Deserialize, Serialize};

use crate::db_types::{Booking, Hold};

/// Fired once per new booking, after the confirmation transaction commits. Duplicate confirmations of the same
/// payment do not fire it again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfirmedEvent {
    pub booking: Booking,
}

impl BookingConfirmedEvent {
    pub fn new(booking: Booking) -> Self {
        Self { booking }
    }
}

/// Fired by the expiry sweep whenever it reaps at least one lapsed hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldsExpiredEvent {
    pub holds: Vec<Hold>,
}

impl HoldsExpiredEvent {
    pub fn new(holds: Vec<Hold>) -> Self {
        Self { holds }
    }
}
