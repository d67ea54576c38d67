use axum::{http::StatusCode, response::IntoResponse, Json};

use primitives::{
    ad::ValidationError,
    adstore::{MessageResponse, Status},
};

/// An application-level failure, converted into the error envelope
/// `{"status": "error", "message": ...}` with the matching status code.
#[derive(Debug, PartialEq, Eq)]
pub enum ResponseError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ResponseError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, message) = match self {
            ResponseError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ResponseError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
        };

        let body = MessageResponse {
            status: Status::Error,
            message,
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<ValidationError> for ResponseError {
    fn from(error: ValidationError) -> Self {
        ResponseError::BadRequest(error.to_string())
    }
}
