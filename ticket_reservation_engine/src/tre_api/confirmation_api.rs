use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Booking, BookingId, NewBooking},
    events::{BookingConfirmedEvent, EventProducers},
    tre_api::errors::ConfirmationError,
    traits::{BookingManagement, ConfirmResult},
};

/// `ConfirmationApi` converts paid-for reservations into durable bookings and serves receipt lookups.
///
/// Confirmation is idempotent on the payment reference: however many times the gateway delivers the same outcome,
/// exactly one booking exists and the confirmed-booking hook fires exactly once.
pub struct ConfirmationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ConfirmationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConfirmationApi")
    }
}

impl<B> ConfirmationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ConfirmationApi<B>
where B: BookingManagement
{
    /// Records a verified payment against the session's holds and returns the booking.
    ///
    /// A lapsed reservation is an error the caller must escalate: the customer has paid for seats the engine no
    /// longer guarantees.
    pub async fn confirm_reservation(&self, request: NewBooking) -> Result<Booking, ConfirmationError> {
        let reference = request.payment_reference.clone();
        let result = self
            .db
            .confirm_reservation(request)
            .await
            .map_err(|e| ConfirmationError::PersistenceFailure(e.to_string()))?;
        match result {
            ConfirmResult::Confirmed(booking) => {
                debug!("✅️ Payment [{reference}] confirmed as booking {}", booking.booking_id);
                self.call_booking_confirmed_hook(&booking).await;
                Ok(booking)
            },
            ConfirmResult::AlreadyConfirmed(booking) => {
                info!(
                    "✅️ Payment [{reference}] was delivered again. Returning existing booking {}",
                    booking.booking_id
                );
                Ok(booking)
            },
            ConfirmResult::NoActiveHolds => {
                error!(
                    "✅️ Payment [{reference}] arrived after the reservation expired. The customer has paid for seats \
                     that are no longer guaranteed. Escalate for a refund or a manual re-seat."
                );
                Err(ConfirmationError::ReservationExpired)
            },
        }
    }

    pub async fn lookup_booking(&self, payment_reference: &str) -> Result<Option<Booking>, ConfirmationError> {
        self.db
            .fetch_booking_by_payment_reference(payment_reference)
            .await
            .map_err(|e| ConfirmationError::PersistenceFailure(e.to_string()))
    }

    pub async fn booking_by_id(&self, booking_id: &BookingId) -> Result<Option<Booking>, ConfirmationError> {
        self.db.fetch_booking_by_id(booking_id).await.map_err(|e| ConfirmationError::PersistenceFailure(e.to_string()))
    }

    async fn call_booking_confirmed_hook(&self, booking: &Booking) {
        for emitter in &self.producers.booking_confirmed_producer {
            debug!("✅️ Notifying booking-confirmed hook subscribers");
            let event = BookingConfirmedEvent::new(booking.clone());
            emitter.publish_event(event).await;
        }
    }
}
