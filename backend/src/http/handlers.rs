//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`QuoteService`](crate::services::QuoteService). A per-request
//! [`CancellationToken`] is cancelled when the handler future is dropped,
//! which happens on client disconnect or when the timeout layer fires.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

use super::dto::{ApiResponse, DeleteQuoteResponse, HealthResponse, ListQuery, SaveQuoteResponse};
use super::error::AppError;
use super::state::AppState;
use crate::models::{Quote, StoredQuote};
use crate::services::ServiceError;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<ApiResponse<T>>, AppError>;

/// Author filter bounds enforced at the transport layer.
pub const AUTHOR_QUERY_MIN_LEN: usize = 3;
pub const AUTHOR_QUERY_MAX_LEN: usize = 100;
/// Path ids longer than this are rejected before parsing.
pub const QUOTE_ID_MAX_LEN: usize = 10;

fn request_token() -> (CancellationToken, DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

fn ok<T>(payload: T) -> HandlerResult<T> {
    Ok(Json(ApiResponse::ok(payload)))
}

fn check_id_shape(id: &str) -> Result<(), AppError> {
    if id.is_empty() {
        return Err(AppError::BadRequest("Quote ID is required".to_string()));
    }
    if id.chars().count() > QUOTE_ID_MAX_LEN {
        return Err(AppError::BadRequest(format!(
            "Quote ID must be between 1 and {} characters long",
            QUOTE_ID_MAX_LEN
        )));
    }
    Ok(())
}

fn path_id(id: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    let Path(id) = id.map_err(|rejection| {
        debug!(error = %rejection, "failed to decode path");
        AppError::BadRequest("Invalid quote ID".to_string())
    })?;
    check_id_shape(&id)?;
    Ok(id)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Reports whether the service is up and storage answers a ping.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (cancel, _guard) = request_token();
    let database = match state.quotes.ping(&cancel).await {
        Ok(()) => "connected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database,
    })
}

// =============================================================================
// Quotes
// =============================================================================

/// POST /api/v1/quotes
///
/// Store a new quote. A JSON `null` body is treated as a missing quote.
pub async fn save_quote(
    State(state): State<AppState>,
    body: Result<Json<Option<Quote>>, JsonRejection>,
) -> HandlerResult<SaveQuoteResponse> {
    let Json(quote) = body.map_err(|rejection| {
        debug!(error = %rejection, "failed to decode request body");
        AppError::BadRequest("Invalid request body".to_string())
    })?;

    let (cancel, _guard) = request_token();
    let id = state.quotes.save(quote, &cancel).await?;

    info!(%id, "quote saved");
    ok(SaveQuoteResponse { id })
}

/// GET /api/v1/quotes[?author=Jane_Doe]
///
/// List all quotes, or only those by `author`. An empty result is a
/// successful empty array.
pub async fn list_quotes(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> HandlerResult<Vec<StoredQuote>> {
    let Query(query) = query.map_err(|rejection| {
        debug!(error = %rejection, "failed to decode query string");
        AppError::BadRequest("Invalid query parameters".to_string())
    })?;
    let (cancel, _guard) = request_token();

    let result = match query.author {
        Some(author) => {
            let len = author.chars().count();
            if !(AUTHOR_QUERY_MIN_LEN..=AUTHOR_QUERY_MAX_LEN).contains(&len) {
                return Err(AppError::BadRequest(format!(
                    "Author query parameter is not valid. It must be between {} and {} characters long.",
                    AUTHOR_QUERY_MIN_LEN, AUTHOR_QUERY_MAX_LEN
                )));
            }
            let author = author.replace('_', " ");
            state.quotes.list_by_author(&author, &cancel).await
        }
        None => state.quotes.list(&cancel).await,
    };

    match result {
        Ok(quotes) => {
            info!(count = quotes.len(), "quotes listed");
            ok(quotes)
        }
        Err(ServiceError::EmptyResult { .. }) => {
            info!("quotes list is empty");
            ok(Vec::new())
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /api/v1/quotes/random
///
/// One quote picked at random, or a `null` payload when none are stored.
pub async fn random_quote(State(state): State<AppState>) -> HandlerResult<Option<Quote>> {
    let (cancel, _guard) = request_token();

    match state.quotes.random(&cancel).await {
        Ok(quote) => ok(Some(quote)),
        Err(ServiceError::EmptyResult { .. }) => {
            info!("quotes list is empty");
            ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// GET /api/v1/quotes/{id}
pub async fn get_quote(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> HandlerResult<Quote> {
    let id = path_id(id)?;
    let (cancel, _guard) = request_token();

    let quote = state.quotes.get(&id, &cancel).await?;
    ok(quote)
}

/// DELETE /api/v1/quotes/{id}
pub async fn delete_quote(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> HandlerResult<DeleteQuoteResponse> {
    let id = path_id(id)?;
    let (cancel, _guard) = request_token();

    state.quotes.delete(&id, &cancel).await?;

    info!(%id, "quote deleted");
    ok(DeleteQuoteResponse {
        message: "Quote deleted successfully".to_string(),
    })
}

/// Fallback for methods a `/api/v1` route does not serve.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

/// Fallback for unknown `/api/v1` paths.
pub async fn not_found() -> AppError {
    AppError::NotFound("Route not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_shape() {
        assert!(check_id_shape("1").is_ok());
        assert!(check_id_shape("1234567890").is_ok());
        assert!(check_id_shape("").is_err());
        assert!(check_id_shape("12345678901").is_err());
    }

    #[test]
    fn test_request_token_cancels_on_drop() {
        let (token, guard) = request_token();
        assert!(!token.is_cancelled());
        drop(guard);
        assert!(token.is_cancelled());
    }
}
