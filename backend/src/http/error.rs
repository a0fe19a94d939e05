//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, warn};

use super::dto::ApiError;
use crate::services::{ErrorKind, ServiceError};

/// Message returned for every 5xx; details only go to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Malformed request input
    BadRequest(String),
    /// Field rules broken; carries the aggregated per-field message
    Validation(String),
    /// Resource not found
    NotFound(String),
    /// Route exists but not for this method
    MethodNotAllowed,
    /// The request ran past the configured timeout
    Timeout,
    /// Internal server error; the message is logged, not returned
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Timeout => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::BadRequest(msg) => {
                warn!(code = %status, "{}", msg);
                ApiError::new("BAD_REQUEST", msg)
            }
            AppError::Validation(msg) => {
                warn!(code = %status, "{}", msg);
                ApiError::new("VALIDATION_FAILED", msg)
            }
            AppError::NotFound(msg) => {
                warn!(code = %status, "{}", msg);
                ApiError::new("NOT_FOUND", msg)
            }
            AppError::MethodNotAllowed => {
                warn!(code = %status, "method not allowed");
                ApiError::new("METHOD_NOT_ALLOWED", "Method not allowed")
            }
            AppError::Timeout => {
                warn!(code = %status, "request timed out");
                ApiError::new("TIMEOUT", "Request timed out")
            }
            AppError::Internal(detail) => {
                error!(code = %status, error = %detail, "request failed");
                ApiError::new("INTERNAL_ERROR", INTERNAL_ERROR_MESSAGE)
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Render an error and its whole source chain on one line.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => AppError::NotFound("Quote not found".to_string()),
            ErrorKind::InputInvalid => AppError::BadRequest(err.to_string()),
            ErrorKind::ValidationFailed => match err {
                ServiceError::ValidationFailed(violations) => {
                    AppError::Validation(violations.message())
                }
                other => AppError::Validation(other.to_string()),
            },
            ErrorKind::EmptyResult
            | ErrorKind::StorageUnavailable
            | ErrorKind::InternalFailure => AppError::Internal(error_chain(&err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RepositoryError;

    #[test]
    fn test_service_errors_map_to_status() {
        let not_found: AppError = ServiceError::DeleteFailed {
            source: RepositoryError::not_found("quote not found"),
        }
        .into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let bad: AppError = ServiceError::InvalidQuoteId { id: "x".into() }.into();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

        let internal: AppError = ServiceError::SaveFailed {
            source: RepositoryError::connection("refused"),
        }
        .into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_detail_keeps_cause() {
        let internal: AppError = ServiceError::GetFailed {
            source: RepositoryError::query("relation does not exist"),
        }
        .into();
        match internal {
            AppError::Internal(detail) => {
                assert!(detail.starts_with("failed to get quote: Query error"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
