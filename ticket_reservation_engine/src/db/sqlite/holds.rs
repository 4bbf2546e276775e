use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Hold, HoldStatus, Seat, SeatId, SessionToken},
};

const HOLD_COLUMNS: &str = "id, seat_id, session_token, price, status, created_at, updated_at, expires_at";

/// Expires any lapsed-but-unreaped active holds over the given seats, so that a stale hold never blocks a fresh
/// claim. Must be the first statement of a hold-creation transaction: being a write, it takes the database write
/// lock up front.
pub async fn expire_stale_for_seats(
    seat_ids: &[SeatId],
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new("UPDATE holds SET status = 'Expired', updated_at = ");
    builder.push_bind(now);
    builder.push(" WHERE status = 'Active' AND expires_at <= ");
    builder.push_bind(now);
    builder.push(" AND seat_id IN (");
    let mut in_list = builder.separated(", ");
    for id in seat_ids {
        in_list.push_bind(id.clone());
    }
    builder.push(")");
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}

/// Returns the seats among `seat_ids` that currently carry an active, unexpired hold.
pub async fn active_conflicts(
    seat_ids: &[SeatId],
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<SeatId>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new("SELECT seat_id FROM holds WHERE status = 'Active' AND expires_at > ");
    builder.push_bind(now);
    builder.push(" AND seat_id IN (");
    let mut in_list = builder.separated(", ");
    for id in seat_ids {
        in_list.push_bind(id.clone());
    }
    builder.push(")");
    let conflicts = builder.build_query_scalar::<SeatId>().fetch_all(conn).await?;
    Ok(conflicts)
}

/// Inserts one active hold, snapshotting the seat's base price. The partial unique index on active holds is the
/// durable backstop: if a rival claimed the seat between the conflict pre-check and this insert, the statement fails
/// with a unique violation and the caller aborts the whole batch.
pub async fn insert_hold(
    seat: &Seat,
    token: &SessionToken,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Hold, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO holds (seat_id, session_token, price, status, created_at, updated_at, expires_at)
            VALUES ($1, $2, $3, 'Active', $4, $5, $6)
            RETURNING id;
        "#,
    )
    .bind(&seat.seat_id)
    .bind(token)
    .bind(seat.base_price)
    .bind(now)
    .bind(now)
    .bind(expires_at)
    .fetch_one(conn)
    .await?;
    trace!("🎫️ Hold {id} created on seat {} for session [{token}]", seat.seat_id);
    Ok(Hold {
        id,
        seat_id: seat.seat_id.clone(),
        session_token: token.clone(),
        price: seat.base_price,
        status: HoldStatus::Active,
        created_at: now,
        updated_at: now,
        expires_at,
    })
}

pub async fn active_holds_for_session(
    token: &SessionToken,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Hold>, SqliteDatabaseError> {
    let q = format!(
        "SELECT {HOLD_COLUMNS} FROM holds WHERE session_token = $1 AND status = 'Active' AND expires_at > $2 ORDER \
         BY seat_id"
    );
    let holds = sqlx::query_as::<_, Hold>(&q).bind(token).bind(now).fetch_all(conn).await?;
    Ok(holds)
}

/// Cancels all active holds for the token and returns them. A token with no active holds yields an empty list, so
/// repeated cancellation is a no-op.
pub async fn cancel_active_for_session(
    token: &SessionToken,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Hold>, SqliteDatabaseError> {
    let q = format!(
        "UPDATE holds SET status = 'Cancelled', updated_at = $2 WHERE session_token = $1 AND status = 'Active' \
         RETURNING {HOLD_COLUMNS}"
    );
    let holds = sqlx::query_as::<_, Hold>(&q).bind(token).bind(now).fetch_all(conn).await?;
    Ok(holds)
}

pub async fn extend_active_for_session(
    token: &SessionToken,
    new_expiry: DateTime<Utc>,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<u64, SqliteDatabaseError> {
    let result = sqlx::query(
        r#"
            UPDATE holds SET expires_at = $1, updated_at = $2
            WHERE session_token = $3 AND status = 'Active' AND expires_at > $4;
        "#,
    )
    .bind(new_expiry)
    .bind(now)
    .bind(token)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Compare-and-sets the session's active, unexpired holds to `Confirmed` and returns them. Only rows still `Active`
/// transition, so a concurrent sweep cannot expire a hold that is being confirmed, and vice versa.
pub async fn confirm_active_for_session(
    token: &SessionToken,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Hold>, SqliteDatabaseError> {
    let q = format!(
        "UPDATE holds SET status = 'Confirmed', updated_at = $2 WHERE session_token = $1 AND status = 'Active' AND \
         expires_at > $2 RETURNING {HOLD_COLUMNS}"
    );
    let holds = sqlx::query_as::<_, Hold>(&q).bind(token).bind(now).fetch_all(conn).await?;
    Ok(holds)
}

/// The reaper's sweep: expires every hold still active past its expiry and returns the reaped rows.
pub async fn expire_overdue(
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Hold>, SqliteDatabaseError> {
    let q = format!(
        "UPDATE holds SET status = 'Expired', updated_at = $1 WHERE status = 'Active' AND expires_at <= $1 \
         RETURNING {HOLD_COLUMNS}"
    );
    let holds = sqlx::query_as::<_, Hold>(&q).bind(now).fetch_all(conn).await?;
    Ok(holds)
}
