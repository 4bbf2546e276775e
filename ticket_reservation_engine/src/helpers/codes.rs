//! Random identifier generators for bookings, tickets and checkout sessions.
//!
//! None of these are secrets in the cryptographic sense, but validation codes are printed on tickets and checked at
//! the door, so the alphabet omits the characters people misread at a glance (0/O, 1/I).

use rand::{distributions::Alphanumeric, thread_rng, Rng};

const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// An eight-character ticket validation code in the form `XXXX-XXXX`.
pub fn new_validation_code() -> String {
    let mut rng = thread_rng();
    let mut code = String::with_capacity(9);
    for i in 0..8 {
        if i == 4 {
            code.push('-');
        }
        let idx = rng.gen_range(0..CODE_ALPHABET.len());
        code.push(CODE_ALPHABET[idx] as char);
    }
    code
}

/// A booking identifier of the form `bk_` followed by 12 alphanumeric characters.
pub fn new_booking_id() -> crate::db_types::BookingId {
    let suffix: String = thread_rng().sample_iter(&Alphanumeric).take(12).map(char::from).collect();
    crate::db_types::BookingId(format!("bk_{suffix}"))
}

/// An opaque 32-character session token correlating the holds of one checkout attempt.
pub fn new_session_token() -> crate::db_types::SessionToken {
    let token: String = thread_rng().sample_iter(&Alphanumeric).take(32).map(char::from).collect();
    crate::db_types::SessionToken(token)
}
