use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use trs_common::Money;

//--------------------------------------        ShowId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ShowId(pub String);

impl FromStr for ShowId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for ShowId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ShowId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for ShowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ShowId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        SeatId        ---------------------------------------------------------
/// The single seat-identity scheme used across the whole engine. Inventory provisioning derives these from the show,
/// section, row and number; the ledger and bookings only ever see the opaque id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct SeatId(pub String);

impl From<String> for SeatId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SeatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for SeatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SeatId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     SessionToken     ---------------------------------------------------------
/// Correlates all holds created for a single checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl From<String> for SessionToken {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       BookingId      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct BookingId(pub String);

impl From<String> for BookingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BookingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl BookingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------         Show         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub show_id: ShowId,
    pub name: String,
    pub venue: String,
    /// ISO currency code. All seat prices for the show are minor units of this currency.
    pub currency: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewShow {
    pub show_id: ShowId,
    pub name: String,
    pub venue: String,
    pub currency: String,
    pub starts_at: Option<DateTime<Utc>>,
}

impl NewShow {
    pub fn new(show_id: ShowId, name: String, venue: String) -> Self {
        Self { show_id, name, venue, currency: "USD".to_string(), starts_at: None }
    }
}

//--------------------------------------         Seat         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub seat_id: SeatId,
    pub show_id: ShowId,
    pub section: String,
    #[sqlx(rename = "seat_row")]
    pub row: String,
    pub number: i64,
    /// The administered price in minor currency units. Holds snapshot this value at creation time.
    pub base_price: Money,
    pub accessible: bool,
    pub grid_x: Option<i64>,
    pub grid_y: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSeat {
    pub section: String,
    pub row: String,
    pub number: i64,
    pub base_price: Money,
    pub accessible: bool,
    pub grid_x: Option<i64>,
    pub grid_y: Option<i64>,
}

impl NewSeat {
    pub fn new(section: &str, row: &str, number: i64, base_price: Money) -> Self {
        Self {
            section: section.to_string(),
            row: row.to_string(),
            number,
            base_price,
            accessible: false,
            grid_x: None,
            grid_y: None,
        }
    }

    pub fn accessible(mut self) -> Self {
        self.accessible = true;
        self
    }

    pub fn at(mut self, x: i64, y: i64) -> Self {
        self.grid_x = Some(x);
        self.grid_y = Some(y);
        self
    }

    /// Derives the canonical seat id for this seat within the given show.
    pub fn seat_id_for(&self, show_id: &ShowId) -> SeatId {
        SeatId(format!("{}:{}:{}{}", show_id, self.section, self.row, self.number))
    }
}

//--------------------------------------      HoldStatus      ---------------------------------------------------------
/// The hold state machine. `Active` is the only non-terminal state; a hold transitions exactly once, to `Confirmed`
/// (payment completed), `Expired` (reaped after the TTL) or `Cancelled` (released by the buyer). Rows are never
/// deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum HoldStatus {
    /// The seat is claimed by an in-progress checkout.
    Active,
    /// The checkout completed and the hold is part of a booking.
    Confirmed,
    /// The hold outlived its expiry window and was reaped.
    Expired,
    /// The buyer (or an admin) released the hold before payment.
    Cancelled,
}

impl Display for HoldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HoldStatus::Active => write!(f, "Active"),
            HoldStatus::Confirmed => write!(f, "Confirmed"),
            HoldStatus::Expired => write!(f, "Expired"),
            HoldStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid status: {0}")]
pub struct ConversionError(String);

impl FromStr for HoldStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Active" => Ok(Self::Active),
            "Confirmed" => Ok(Self::Confirmed),
            "Expired" => Ok(Self::Expired),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid hold status: {s}"))),
        }
    }
}

impl From<String> for HoldStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid hold status: {value}. But this conversion cannot fail. Defaulting to Active");
            HoldStatus::Active
        })
    }
}

//--------------------------------------         Hold         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Hold {
    pub id: i64,
    pub seat_id: SeatId,
    pub session_token: SessionToken,
    /// The seat's base price at the moment the hold was created. This is the price the buyer pays, regardless of
    /// later administrative price changes.
    pub price: Money,
    pub status: HoldStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

//--------------------------------------      HoldRequest     ---------------------------------------------------------
/// A request to claim a batch of seats for one checkout attempt. The batch is all-or-nothing.
#[derive(Debug, Clone)]
pub struct HoldRequest {
    pub show_id: ShowId,
    pub seat_ids: Vec<SeatId>,
    pub session_token: SessionToken,
    pub ttl: Duration,
}

impl HoldRequest {
    pub fn new(show_id: ShowId, seat_ids: Vec<SeatId>, session_token: SessionToken, ttl: Duration) -> Self {
        Self { show_id, seat_ids, session_token, ttl }
    }
}

//--------------------------------------    BookingStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum BookingStatus {
    Confirmed,
    /// A post-sale cancellation/refund. The transition exists for support workflows; bookings are otherwise immutable.
    Cancelled,
}

impl Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingStatus::Confirmed => write!(f, "Confirmed"),
            BookingStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for BookingStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Confirmed" => Ok(Self::Confirmed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid booking status: {s}"))),
        }
    }
}

impl From<String> for BookingStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid booking status: {value}. But this conversion cannot fail. Defaulting to Confirmed");
            BookingStatus::Confirmed
        })
    }
}

//--------------------------------------       Booking        ---------------------------------------------------------
/// A durable record that a set of seats was purchased together. Created exactly once per payment reference.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub booking_id: BookingId,
    pub session_token: SessionToken,
    /// The payment gateway's unique identifier for the completed transaction; the idempotency key for confirmation.
    pub payment_reference: String,
    pub customer_email: String,
    pub customer_name: String,
    /// Short human/QR-scannable code printed on the ticket.
    pub validation_code: String,
    pub total_amount: Money,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub seats: Vec<BookingSeat>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct BookingSeat {
    pub seat_id: SeatId,
    pub price_paid: Money,
}

//--------------------------------------      NewBooking      ---------------------------------------------------------
/// The inputs to a confirmation attempt, assembled from the payment gateway's outcome notification.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub session_token: SessionToken,
    pub payment_reference: String,
    pub customer_email: String,
    pub customer_name: String,
}

impl NewBooking {
    pub fn new(session_token: SessionToken, payment_reference: String, email: String, name: String) -> Self {
        Self { session_token, payment_reference, customer_email: email, customer_name: name }
    }
}

//--------------------------------------      SeatStatus      ---------------------------------------------------------
/// The derived, client-facing state of a seat: sold beats held, held beats available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Held,
    Sold,
}

impl Display for SeatStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeatStatus::Available => write!(f, "available"),
            SeatStatus::Held => write!(f, "held"),
            SeatStatus::Sold => write!(f, "sold"),
        }
    }
}

//--------------------------------------   SeatAvailability   ---------------------------------------------------------
/// One row of the availability map: the seat's static attributes plus its derived status, computed in a single
/// consistent snapshot so a seat can never report two states at once.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SeatAvailability {
    pub seat_id: SeatId,
    pub section: String,
    #[sqlx(rename = "seat_row")]
    pub row: String,
    pub number: i64,
    pub base_price: Money,
    pub accessible: bool,
    pub status: SeatStatus,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hold_status_round_trip() {
        for status in [HoldStatus::Active, HoldStatus::Confirmed, HoldStatus::Expired, HoldStatus::Cancelled] {
            assert_eq!(status.to_string().parse::<HoldStatus>().unwrap(), status);
        }
        assert!("Pending".parse::<HoldStatus>().is_err());
    }

    #[test]
    fn seat_id_derivation() {
        let seat = NewSeat::new("Stalls", "C", 12, Money::from(4500));
        let id = seat.seat_id_for(&ShowId::from("gala-2024"));
        assert_eq!(id.as_str(), "gala-2024:Stalls:C12");
    }

    #[test]
    fn seat_ids_sort_deterministically() {
        let mut ids = vec![SeatId::from("s:A:3"), SeatId::from("s:A:1"), SeatId::from("s:A:2")];
        ids.sort();
        assert_eq!(ids, vec![SeatId::from("s:A:1"), SeatId::from("s:A:2"), SeatId::from("s:A:3")]);
    }
}
