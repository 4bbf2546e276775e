mod codes;

pub use codes::{new_booking_id, new_session_token, new_validation_code};
