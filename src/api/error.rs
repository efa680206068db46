//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::error;

use crate::application::ApplicationError;
use crate::domain::DomainError;

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Failure of a handler, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub enum ApiError {
    /// Path segment that is not a valid id
    BadId(String),
    App(ApplicationError),
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        ApiError::App(e)
    }
}

fn map_domain_error(err: &DomainError) -> (StatusCode, String) {
    match err {
        DomainError::NotFound { .. } | DomainError::NameNotFound { .. } => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        DomainError::DuplicateName(_)
        | DomainError::DuplicateCustomer { .. }
        | DomainError::DuplicateId { .. }
        | DomainError::CycleDetected { .. } => (StatusCode::CONFLICT, err.to_string()),
        DomainError::InvalidName { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}

impl ApiError {
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            // Unmatched ids never reach a record, same as an unknown one
            ApiError::BadId(raw) => (StatusCode::NOT_FOUND, format!("not found: {raw}")),
            ApiError::App(ApplicationError::Domain(e)) => map_domain_error(e),
            ApiError::App(e) => {
                error!("request failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
