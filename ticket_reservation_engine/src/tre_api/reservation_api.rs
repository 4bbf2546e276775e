use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;

use crate::{
    db_types::{Hold, HoldRequest, SessionToken, ShowId},
    events::{EventProducers, HoldsExpiredEvent},
    tre_api::{
        errors::ReservationError,
        reservation_objects::{AvailabilityReport, SweepResult},
    },
    traits::{InsertHoldsResult, ReservationBackend},
};

/// `ReservationApi` is the primary API for the hold lifecycle: claiming seats for a checkout session, releasing or
/// extending them, reading the availability map, and running the expiry sweep.
pub struct ReservationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReservationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReservationApi")
    }
}

impl<B> ReservationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReservationApi<B>
where B: ReservationBackend
{
    /// Attempts to place an all-or-nothing hold on the requested seats. On success, every seat in the request is
    /// claimed for the session until the shared expiry instant.
    pub async fn create_holds(&self, request: HoldRequest) -> Result<Vec<Hold>, ReservationError> {
        if request.seat_ids.is_empty() {
            return Err(ReservationError::EmptySelection);
        }
        let show_id = request.show_id.clone();
        if self.db.fetch_show(&show_id).await.map_err(|e| ReservationError::DatabaseError(e.to_string()))?.is_none() {
            return Err(ReservationError::ShowNotFound(show_id));
        }
        let token = request.session_token.clone();
        let n = request.seat_ids.len();
        let result =
            self.db.create_holds(request).await.map_err(|e| ReservationError::DatabaseError(e.to_string()))?;
        match result {
            InsertHoldsResult::Created(holds) => {
                debug!("🎟️ Session [{token}] holds {} seat(s) for show [{show_id}]", holds.len());
                Ok(holds)
            },
            InsertHoldsResult::Conflict(seats) => {
                debug!("🎟️ Session [{token}] was refused {} of {n} seat(s) for show [{show_id}]", seats.len());
                Err(ReservationError::SeatsUnavailable(seats))
            },
            InsertHoldsResult::UnknownSeats(seats) => Err(ReservationError::SeatNotFound(seats)),
            InsertHoldsResult::MixedShows => Err(ReservationError::MixedShows(show_id)),
        }
    }

    /// Releases every active hold for the session. Idempotent; releasing an unknown or spent token returns an empty
    /// list.
    pub async fn cancel_holds(&self, token: &SessionToken) -> Result<Vec<Hold>, ReservationError> {
        self.db.cancel_holds(token).await.map_err(|e| ReservationError::DatabaseError(e.to_string()))
    }

    /// Pushes the session's expiry window forward by `additional`.
    pub async fn extend_holds(
        &self,
        token: &SessionToken,
        additional: Duration,
    ) -> Result<Vec<Hold>, ReservationError> {
        let extended = self
            .db
            .extend_holds(token, additional)
            .await
            .map_err(|e| ReservationError::DatabaseError(e.to_string()))?;
        extended.ok_or(ReservationError::HoldNotFound)
    }

    pub async fn active_holds(&self, token: &SessionToken) -> Result<Vec<Hold>, ReservationError> {
        self.db.active_holds_for_session(token).await.map_err(|e| ReservationError::DatabaseError(e.to_string()))
    }

    /// The availability map for every seat in the show, taken in one consistent snapshot.
    pub async fn availability(&self, show_id: &ShowId) -> Result<AvailabilityReport, ReservationError> {
        if self.db.fetch_show(show_id).await.map_err(|e| ReservationError::DatabaseError(e.to_string()))?.is_none() {
            return Err(ReservationError::ShowNotFound(show_id.clone()));
        }
        let seats =
            self.db.seat_availability(show_id).await.map_err(|e| ReservationError::DatabaseError(e.to_string()))?;
        Ok(AvailabilityReport::new(show_id.clone(), seats))
    }

    /// One pass of the expiry reaper: every hold that has outlived its window is released and subscribers are
    /// notified.
    pub async fn expire_old_holds(&self) -> Result<SweepResult, ReservationError> {
        let released = self
            .db
            .expire_overdue_holds(Utc::now())
            .await
            .map_err(|e| ReservationError::DatabaseError(e.to_string()))?;
        if !released.is_empty() {
            info!("🎟️ Expiry sweep released {} lapsed hold(s)", released.len());
            self.call_holds_expired_hook(released.clone()).await;
        }
        Ok(SweepResult { released })
    }

    async fn call_holds_expired_hook(&self, holds: Vec<Hold>) {
        for emitter in &self.producers.holds_expired_producer {
            debug!("🎟️ Notifying holds-expired hook subscribers");
            let event = HoldsExpiredEvent::new(holds.clone());
            emitter.publish_event(event).await;
        }
    }
}
