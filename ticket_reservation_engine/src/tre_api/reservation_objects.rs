use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Hold, SeatAvailability, ShowId};

/// The full availability map for a show at a single instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub show_id: ShowId,
    pub generated_at: DateTime<Utc>,
    pub seats: Vec<SeatAvailability>,
}

impl AvailabilityReport {
    pub fn new(show_id: ShowId, seats: Vec<SeatAvailability>) -> Self {
        Self { show_id, generated_at: Utc::now(), seats }
    }
}

/// The outcome of one expiry sweep.
#[derive(Debug, Clone, Default)]
pub struct SweepResult {
    pub released: Vec<Hold>,
}

impl SweepResult {
    pub fn released_count(&self) -> usize {
        self.released.len()
    }
}
