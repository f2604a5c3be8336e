use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error("This time slot was just booked by someone else. Please select a different time.")]
    Conflict,

    #[error("Booking not found")]
    NotFound,

    #[error("Temporary failure: {0}")]
    Transient(String),
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BookingError::Validation(errors.to_string())
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            BookingError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            BookingError::Conflict => (StatusCode::CONFLICT, self.to_string()),
            BookingError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            BookingError::Transient(msg) => {
                error!("Transient failure: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Something went wrong. Please try again.".to_string(),
                )
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
