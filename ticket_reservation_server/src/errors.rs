use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use thiserror::Error;
use ticket_reservation_engine::{ConfirmationError, ReservationError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Webhook token missing or invalid")]
    WebhookAuthError,
    #[error("Reservation error. {0}")]
    ReservationError(#[from] ReservationError),
    #[error("Confirmation error. {0}")]
    ConfirmationError(#[from] ConfirmationError),
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::WebhookAuthError => StatusCode::UNAUTHORIZED,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::ReservationError(e) => match e {
                ReservationError::EmptySelection => StatusCode::BAD_REQUEST,
                ReservationError::SeatNotFound(_) => StatusCode::BAD_REQUEST,
                ReservationError::MixedShows(_) => StatusCode::BAD_REQUEST,
                ReservationError::ShowNotFound(_) => StatusCode::NOT_FOUND,
                ReservationError::SeatsUnavailable(_) => StatusCode::CONFLICT,
                ReservationError::HoldNotFound => StatusCode::GONE,
                ReservationError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::ConfirmationError(e) => match e {
                ConfirmationError::ReservationExpired => StatusCode::GONE,
                ConfirmationError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
