use std::fmt::Debug;

use chrono::{DateTime, Duration, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{bookings, db_url, errors, holds, new_pool, seats, SqliteDatabaseError};
use crate::{
    db_types::{
        Booking, BookingId, BookingSeat, Hold, HoldRequest, NewBooking, NewSeat, NewShow, Seat, SeatAvailability,
        SeatId, SessionToken, Show, ShowId,
    },
    helpers::{new_booking_id, new_validation_code},
    traits::{AvailabilityView, BookingManagement, ConfirmResult, InsertHoldsResult, ReservationLedger, SeatInventory},
};

/// How many validation codes to try before giving up. The code space is 32^8, so a second collision in a row
/// already indicates something badly wrong with the RNG.
const MAX_CODE_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Connects to the database given by the `TRS_DATABASE_URL` environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl SeatInventory for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn fetch_show(&self, show_id: &ShowId) -> Result<Option<Show>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        seats::fetch_show(show_id, &mut conn).await
    }

    async fn fetch_seats_for_show(&self, show_id: &ShowId) -> Result<Vec<Seat>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        seats::fetch_seats_for_show(show_id, &mut conn).await
    }

    async fn fetch_seat(&self, seat_id: &SeatId) -> Result<Option<Seat>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        seats::fetch_seat(seat_id, &mut conn).await
    }

    async fn provision_show(&self, show: NewShow, new_seats: Vec<NewSeat>) -> Result<Show, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let show_id = show.show_id.clone();
        if let Err(e) = seats::insert_show(&show, &mut tx).await {
            return match e {
                SqliteDatabaseError::DriverError(ref err) if errors::is_unique_violation(err) => {
                    Err(SqliteDatabaseError::DuplicateShow(show_id.to_string()))
                },
                e => Err(e),
            };
        }
        let n = new_seats.len();
        for seat in &new_seats {
            seats::insert_seat(&show_id, seat, &mut tx).await?;
        }
        let show = seats::fetch_show(&show_id, &mut tx).await?.ok_or_else(|| {
            SqliteDatabaseError::QueryError(format!("Show {show_id} vanished inside its own provisioning transaction"))
        })?;
        tx.commit().await?;
        debug!("🗃️ Show [{show_id}] provisioned with {n} seats");
        Ok(show)
    }
}

impl ReservationLedger for SqliteDatabase {
    type Error = SqliteDatabaseError;

    /// The whole batch runs in one transaction whose first statement is an `UPDATE`, so the transaction takes the
    /// write lock immediately rather than deadlocking on a read-to-write upgrade under contention. The partial unique
    /// index on active holds catches anything the pre-checks miss.
    async fn create_holds(&self, request: HoldRequest) -> Result<InsertHoldsResult, Self::Error> {
        let mut seat_ids = request.seat_ids.clone();
        seat_ids.sort();
        seat_ids.dedup();
        let now = Utc::now();
        let expires_at = now + request.ttl;
        let token = &request.session_token;

        let mut tx = self.pool.begin().await?;
        // Lapsed holds the reaper has not swept yet must not block a fresh claim.
        let reaped = holds::expire_stale_for_seats(&seat_ids, now, &mut tx).await?;
        if reaped > 0 {
            debug!("🗃️ Expired {reaped} stale hold(s) in the path of session [{token}]");
        }
        let found = seats::fetch_seats_by_ids(&seat_ids, &mut tx).await?;
        if found.len() < seat_ids.len() {
            let known = found.iter().map(|s| s.seat_id.clone()).collect::<Vec<_>>();
            let missing = seat_ids.into_iter().filter(|id| !known.contains(id)).collect();
            return Ok(InsertHoldsResult::UnknownSeats(missing));
        }
        if found.iter().any(|s| s.show_id != request.show_id) {
            return Ok(InsertHoldsResult::MixedShows);
        }
        let sold = bookings::sold_seats(&seat_ids, &mut tx).await?;
        if !sold.is_empty() {
            return Ok(InsertHoldsResult::Conflict(sold));
        }
        let conflicts = holds::active_conflicts(&seat_ids, now, &mut tx).await?;
        if !conflicts.is_empty() {
            return Ok(InsertHoldsResult::Conflict(conflicts));
        }
        let mut created = Vec::with_capacity(found.len());
        for seat in &found {
            match holds::insert_hold(seat, token, now, expires_at, &mut tx).await {
                Ok(hold) => created.push(hold),
                Err(SqliteDatabaseError::DriverError(ref e)) if errors::is_unique_violation(e) => {
                    // A rival slipped in between the conflict check and this insert. Dropping the transaction rolls
                    // back any holds already written, keeping the batch all-or-nothing.
                    debug!("🗃️ Seat {} was claimed mid-batch. Aborting holds for session [{token}]", seat.seat_id);
                    return Ok(InsertHoldsResult::Conflict(vec![seat.seat_id.clone()]));
                },
                Err(e) => return Err(e),
            }
        }
        tx.commit().await?;
        debug!("🗃️ {} hold(s) created for session [{token}], expiring at {expires_at}", created.len());
        Ok(InsertHoldsResult::Created(created))
    }

    async fn cancel_holds(&self, token: &SessionToken) -> Result<Vec<Hold>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        let cancelled = holds::cancel_active_for_session(token, Utc::now(), &mut conn).await?;
        if !cancelled.is_empty() {
            debug!("🗃️ {} hold(s) cancelled for session [{token}]", cancelled.len());
        }
        Ok(cancelled)
    }

    async fn extend_holds(&self, token: &SessionToken, additional: Duration) -> Result<Option<Vec<Hold>>, Self::Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let active = holds::active_holds_for_session(token, now, &mut tx).await?;
        let Some(latest) = active.iter().map(|h| h.expires_at).max() else {
            return Ok(None);
        };
        let new_expiry = latest + additional;
        holds::extend_active_for_session(token, new_expiry, now, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {} hold(s) for session [{token}] extended to {new_expiry}", active.len());
        let extended = active
            .into_iter()
            .map(|mut h| {
                h.expires_at = new_expiry;
                h.updated_at = now;
                h
            })
            .collect();
        Ok(Some(extended))
    }

    async fn active_holds_for_session(&self, token: &SessionToken) -> Result<Vec<Hold>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        holds::active_holds_for_session(token, Utc::now(), &mut conn).await
    }

    async fn expire_overdue_holds(&self, now: DateTime<Utc>) -> Result<Vec<Hold>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        holds::expire_overdue(now, &mut conn).await
    }
}

impl AvailabilityView for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn seat_availability(&self, show_id: &ShowId) -> Result<Vec<SeatAvailability>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        seats::seat_availability(show_id, Utc::now(), &mut conn).await
    }
}

impl BookingManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn confirm_reservation(&self, request: NewBooking) -> Result<ConfirmResult, Self::Error> {
        let reference = request.payment_reference.as_str();
        let token = &request.session_token;
        // Cheap idempotency check outside the write transaction. Most duplicate webhook deliveries stop here.
        let mut conn = self.pool.acquire().await?;
        if let Some(existing) = bookings::fetch_booking_by_payment_reference(reference, &mut conn).await? {
            debug!("🗃️ Payment [{reference}] was already confirmed as booking {}", existing.booking_id);
            return Ok(ConfirmResult::AlreadyConfirmed(existing));
        }
        drop(conn);

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        // The compare-and-set doubles as the transaction's opening write, claiming the write lock up front.
        let confirmed = holds::confirm_active_for_session(token, now, &mut tx).await?;
        if confirmed.is_empty() {
            // Either the holds lapsed, or a rival confirmation committed between the check above and this
            // transaction. Tell the two cases apart before reporting failure.
            drop(tx);
            let mut conn = self.pool.acquire().await?;
            return match bookings::fetch_booking_by_payment_reference(reference, &mut conn).await? {
                Some(existing) => Ok(ConfirmResult::AlreadyConfirmed(existing)),
                None => Ok(ConfirmResult::NoActiveHolds),
            };
        }
        let total = confirmed.iter().map(|h| h.price).sum();
        let booking_id = new_booking_id();
        let mut row_id = None;
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = new_validation_code();
            match bookings::insert_booking(
                &booking_id,
                token,
                reference,
                &request.customer_email,
                &request.customer_name,
                &code,
                total,
                now,
                &mut tx,
            )
            .await
            {
                Ok(id) => {
                    row_id = Some((id, code));
                    break;
                },
                Err(ref e) if errors::unique_violation_on(e, "bookings.payment_reference") => {
                    drop(tx);
                    let mut conn = self.pool.acquire().await?;
                    let existing =
                        bookings::fetch_booking_by_payment_reference(reference, &mut conn).await?.ok_or_else(|| {
                            SqliteDatabaseError::QueryError(format!(
                                "Payment [{reference}] exists per the unique index but could not be fetched"
                            ))
                        })?;
                    return Ok(ConfirmResult::AlreadyConfirmed(existing));
                },
                Err(ref e) if errors::unique_violation_on(e, "bookings.validation_code") => {
                    warn!("🗃️ Validation code collision for booking {booking_id}. Generating another.");
                },
                Err(e) => return Err(e.into()),
            }
        }
        let Some((id, validation_code)) = row_id else {
            return Err(SqliteDatabaseError::ValidationCodeExhausted(booking_id.to_string()));
        };
        let mut booking_seats = Vec::with_capacity(confirmed.len());
        for hold in &confirmed {
            bookings::insert_booking_seat(&booking_id, &hold.seat_id, hold.price, &mut tx).await?;
            booking_seats.push(BookingSeat { seat_id: hold.seat_id.clone(), price_paid: hold.price });
        }
        tx.commit().await?;
        info!(
            "🗃️ Booking {booking_id} confirmed for payment [{reference}]: {} seat(s), total {total}",
            booking_seats.len()
        );
        Ok(ConfirmResult::Confirmed(Booking {
            id,
            booking_id,
            session_token: token.clone(),
            payment_reference: reference.to_string(),
            customer_email: request.customer_email,
            customer_name: request.customer_name,
            validation_code,
            total_amount: total,
            status: crate::db_types::BookingStatus::Confirmed,
            created_at: now,
            seats: booking_seats,
        }))
    }

    async fn fetch_booking_by_payment_reference(&self, reference: &str) -> Result<Option<Booking>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        bookings::fetch_booking_by_payment_reference(reference, &mut conn).await
    }

    async fn fetch_booking_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        bookings::fetch_booking_by_id(booking_id, &mut conn).await
    }
}
