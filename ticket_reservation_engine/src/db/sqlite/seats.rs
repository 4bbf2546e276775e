use chrono::{DateTime, Utc};
use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewSeat, NewShow, Seat, SeatAvailability, SeatId, Show, ShowId},
};

pub async fn insert_show(show: &NewShow, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO shows (show_id, name, venue, currency, starts_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id;
        "#,
    )
    .bind(&show.show_id)
    .bind(&show.name)
    .bind(&show.venue)
    .bind(&show.currency)
    .bind(show.starts_at)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn fetch_show(show_id: &ShowId, conn: &mut SqliteConnection) -> Result<Option<Show>, SqliteDatabaseError> {
    let show = sqlx::query_as::<_, Show>(
        r#"
            SELECT id, show_id, name, venue, currency, starts_at, created_at
            FROM shows
            WHERE show_id = $1;
        "#,
    )
    .bind(show_id)
    .fetch_one(conn)
    .await;
    match show {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(s) => Ok(Some(s)),
    }
}

/// Inserts one seat of a show's seat map. The seat id is derived here and nowhere else.
pub async fn insert_seat(
    show_id: &ShowId,
    seat: &NewSeat,
    conn: &mut SqliteConnection,
) -> Result<SeatId, SqliteDatabaseError> {
    let seat_id = seat.seat_id_for(show_id);
    sqlx::query(
        r#"
            INSERT INTO seats (seat_id, show_id, section, seat_row, number, base_price, accessible, grid_x, grid_y)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9);
        "#,
    )
    .bind(&seat_id)
    .bind(show_id)
    .bind(&seat.section)
    .bind(&seat.row)
    .bind(seat.number)
    .bind(seat.base_price)
    .bind(seat.accessible)
    .bind(seat.grid_x)
    .bind(seat.grid_y)
    .execute(conn)
    .await?;
    Ok(seat_id)
}

const SEAT_COLUMNS: &str =
    "id, seat_id, show_id, section, seat_row, number, base_price, accessible, grid_x, grid_y, created_at, updated_at";

pub async fn fetch_seats_for_show(
    show_id: &ShowId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Seat>, SqliteDatabaseError> {
    let q = format!("SELECT {SEAT_COLUMNS} FROM seats WHERE show_id = $1 ORDER BY section, seat_row, number");
    let seats = sqlx::query_as::<_, Seat>(&q).bind(show_id).fetch_all(conn).await?;
    Ok(seats)
}

pub async fn fetch_seat(seat_id: &SeatId, conn: &mut SqliteConnection) -> Result<Option<Seat>, SqliteDatabaseError> {
    let q = format!("SELECT {SEAT_COLUMNS} FROM seats WHERE seat_id = $1");
    let seat = sqlx::query_as::<_, Seat>(&q).bind(seat_id).fetch_one(conn).await;
    match seat {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(s) => Ok(Some(s)),
    }
}

/// Fetches the given seats ordered by seat id, so that callers lock seats in a globally consistent order.
pub async fn fetch_seats_by_ids(
    seat_ids: &[SeatId],
    conn: &mut SqliteConnection,
) -> Result<Vec<Seat>, SqliteDatabaseError> {
    if seat_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder = QueryBuilder::new(format!("SELECT {SEAT_COLUMNS} FROM seats WHERE seat_id IN ("));
    let mut in_list = builder.separated(", ");
    for id in seat_ids {
        in_list.push_bind(id.clone());
    }
    builder.push(") ORDER BY seat_id");
    trace!("🎫️ Executing query: {}", builder.sql());
    let seats = builder.build_query_as::<Seat>().fetch_all(conn).await?;
    Ok(seats)
}

/// Computes the status of every seat in the show in a single query, i.e. one consistent snapshot. A seat is sold if
/// it belongs to a non-cancelled booking, held if it has an active unexpired hold, and available otherwise.
pub async fn seat_availability(
    show_id: &ShowId,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<SeatAvailability>, SqliteDatabaseError> {
    let seats = sqlx::query_as::<_, SeatAvailability>(
        r#"
            SELECT
                s.seat_id,
                s.section,
                s.seat_row,
                s.number,
                s.base_price,
                s.accessible,
                CASE
                    WHEN sold.seat_id IS NOT NULL THEN 'Sold'
                    WHEN held.seat_id IS NOT NULL THEN 'Held'
                    ELSE 'Available'
                END AS status
            FROM seats s
            LEFT JOIN (
                SELECT seat_id FROM holds WHERE status = 'Active' AND expires_at > $2
            ) held ON held.seat_id = s.seat_id
            LEFT JOIN (
                SELECT bs.seat_id AS seat_id
                FROM booking_seats bs
                JOIN bookings b ON b.booking_id = bs.booking_id
                WHERE b.status <> 'Cancelled'
            ) sold ON sold.seat_id = s.seat_id
            WHERE s.show_id = $1
            ORDER BY s.section, s.seat_row, s.number;
        "#,
    )
    .bind(show_id)
    .bind(now)
    .fetch_all(conn)
    .await?;
    Ok(seats)
}
