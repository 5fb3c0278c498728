use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use roam_core::repository::RepoError;
use roam_core::trip::BookingError;

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    CapacityError(String),
    StateError(String),
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            AppError::AuthorizationError(_) => StatusCode::FORBIDDEN,
            AppError::ValidationError(_)
            | AppError::CapacityError(_)
            | AppError::StateError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFoundError(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::AuthenticationError(msg)
            | AppError::AuthorizationError(msg)
            | AppError::ValidationError(msg)
            | AppError::NotFoundError(msg)
            | AppError::CapacityError(msg)
            | AppError::StateError(msg) => msg,
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                "Internal Server Error".to_string()
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            RepoError::Booking(BookingError::TripFull) => {
                AppError::CapacityError(err.to_string())
            }
            RepoError::Booking(_) => AppError::StateError(err.to_string()),
            RepoError::Validation(msg) => AppError::ValidationError(msg),
            RepoError::Duplicate(_) => AppError::ValidationError(err.to_string()),
            RepoError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_errors_map_to_spec_status_codes() {
        let cases = [
            (RepoError::NotFound("Trip"), StatusCode::NOT_FOUND),
            (
                RepoError::Booking(BookingError::TripFull),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepoError::Booking(BookingError::AlreadyBooked),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepoError::Booking(BookingError::NotBooked),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepoError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (RepoError::Duplicate("User"), StatusCode::BAD_REQUEST),
            (
                RepoError::Storage("connection reset".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(AppError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_booking_error_messages_survive_mapping() {
        let full = AppError::from(RepoError::Booking(BookingError::TripFull));
        match full {
            AppError::CapacityError(msg) => assert_eq!(msg, "Trip is already full"),
            other => panic!("expected CapacityError, got {:?}", other),
        }

        let duplicate = AppError::from(RepoError::Duplicate("User"));
        match duplicate {
            AppError::ValidationError(msg) => assert_eq!(msg, "User already exists"),
            other => panic!("expected ValidationError, got {:?}", other),
        }
    }

    #[test]
    fn test_internal_errors_are_masked() {
        let err = AppError::InternalServerError("password hashing failed: oom".into());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
