use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;
use trs_common::Money;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Booking, BookingId, BookingSeat, SeatId, SessionToken},
};

const BOOKING_COLUMNS: &str = "id, booking_id, session_token, payment_reference, customer_email, customer_name, \
                               validation_code, total_amount, status, created_at";

/// Returns the seats among `seat_ids` that already belong to a non-cancelled booking.
pub async fn sold_seats(
    seat_ids: &[SeatId],
    conn: &mut SqliteConnection,
) -> Result<Vec<SeatId>, SqliteDatabaseError> {
    let mut builder = sqlx::QueryBuilder::new(
        "SELECT bs.seat_id FROM booking_seats bs JOIN bookings b ON b.booking_id = bs.booking_id WHERE b.status <> \
         'Cancelled' AND bs.seat_id IN (",
    );
    let mut in_list = builder.separated(", ");
    for id in seat_ids {
        in_list.push_bind(id.clone());
    }
    builder.push(")");
    let sold = builder.build_query_scalar::<SeatId>().fetch_all(conn).await?;
    Ok(sold)
}

/// Inserts the booking row. A unique violation on `payment_reference` means another confirmation of the same payment
/// won the race; a violation on `validation_code` means the generated code collided and the caller should retry with
/// a fresh one. Both are surfaced as the raw driver error so the caller can tell them apart.
pub async fn insert_booking(
    booking_id: &BookingId,
    token: &SessionToken,
    payment_reference: &str,
    customer_email: &str,
    customer_name: &str,
    validation_code: &str,
    total_amount: Money,
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, sqlx::Error> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
            INSERT INTO bookings
                (booking_id, session_token, payment_reference, customer_email, customer_name, validation_code,
                 total_amount, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'Confirmed', $8)
            RETURNING id;
        "#,
    )
    .bind(booking_id)
    .bind(token)
    .bind(payment_reference)
    .bind(customer_email)
    .bind(customer_name)
    .bind(validation_code)
    .bind(total_amount)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("🧾️ Booking {booking_id} stored for payment [{payment_reference}]");
    Ok(id)
}

pub async fn insert_booking_seat(
    booking_id: &BookingId,
    seat_id: &SeatId,
    price_paid: Money,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    sqlx::query("INSERT INTO booking_seats (booking_id, seat_id, price_paid) VALUES ($1, $2, $3)")
        .bind(booking_id)
        .bind(seat_id)
        .bind(price_paid)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn seats_for_booking(
    booking_id: &BookingId,
    conn: &mut SqliteConnection,
) -> Result<Vec<BookingSeat>, SqliteDatabaseError> {
    let seats = sqlx::query_as::<_, BookingSeat>(
        "SELECT seat_id, price_paid FROM booking_seats WHERE booking_id = $1 ORDER BY seat_id",
    )
    .bind(booking_id)
    .fetch_all(conn)
    .await?;
    Ok(seats)
}

pub async fn fetch_booking_by_payment_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, SqliteDatabaseError> {
    let q = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE payment_reference = $1");
    let booking = sqlx::query_as::<_, Booking>(&q).bind(reference).fetch_one(&mut *conn).await;
    attach_seats(booking, conn).await
}

pub async fn fetch_booking_by_id(
    booking_id: &BookingId,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, SqliteDatabaseError> {
    let q = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1");
    let booking = sqlx::query_as::<_, Booking>(&q).bind(booking_id).fetch_one(&mut *conn).await;
    attach_seats(booking, conn).await
}

async fn attach_seats(
    booking: Result<Booking, sqlx::Error>,
    conn: &mut SqliteConnection,
) -> Result<Option<Booking>, SqliteDatabaseError> {
    match booking {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(mut b) => {
            b.seats = seats_for_booking(&b.booking_id, conn).await?;
            Ok(Some(b))
        },
    }
}
