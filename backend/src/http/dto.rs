//! Data Transfer Objects for the HTTP API.
//!
//! Every body under `/api/v1` uses the same envelope: `{"status":"OK","payload":..}`
//! on success and `{"status":"Error","code":..,"error":..}` on failure.

use serde::{Deserialize, Serialize};

use crate::models::QuoteId;

/// Envelope status marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Error")]
    Error,
}

/// Successful response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub payload: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            status: ResponseStatus::Ok,
            payload,
        }
    }
}

/// Error response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub status: ResponseStatus,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub error: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            code: code.into(),
            error: error.into(),
        }
    }
}

/// Response for quote creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveQuoteResponse {
    pub id: QuoteId,
}

/// Response for quote deletion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteQuoteResponse {
    pub message: String,
}

/// Query parameters for the list endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    /// Exact author filter; `_` stands in for spaces.
    #[serde(default)]
    pub author: Option<String>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(ApiResponse::ok(SaveQuoteResponse { id: QuoteId(3) }))
            .unwrap();
        assert_eq!(ok, json!({"status": "OK", "payload": {"id": 3}}));

        let empty = serde_json::to_value(ApiResponse::<Option<()>>::ok(None)).unwrap();
        assert_eq!(empty, json!({"status": "OK", "payload": null}));

        let err = serde_json::to_value(ApiError::new("NOT_FOUND", "Quote not found")).unwrap();
        assert_eq!(
            err,
            json!({"status": "Error", "code": "NOT_FOUND", "error": "Quote not found"})
        );
    }
}
