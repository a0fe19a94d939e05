//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (request ids, tracing,
//! timeouts, compression, CORS), and creates the axum router ready for serving.

use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{header, Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::error::AppError;
use super::handlers;
use super::state::AppState;

/// Quote bodies are capped well below this; anything larger is rejected.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Status returned when a request runs past its timeout.
pub const TIMEOUT_STATUS: StatusCode = StatusCode::SERVICE_UNAVAILABLE;

/// The timeout layer answers with an empty body; give it the error envelope.
async fn envelope_timeout(response: Response) -> Response {
    if response.status() == TIMEOUT_STATUS
        && !response.headers().contains_key(header::CONTENT_TYPE)
    {
        return AppError::Timeout.into_response();
    }
    response
}

/// Create the main application router with all routes and middleware.
///
/// Requests running longer than `request_timeout` are aborted with
/// [`TIMEOUT_STATUS`]; dropping the handler cancels its storage call.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route(
            "/quotes",
            post(handlers::save_quote)
                .get(handlers::list_quotes)
                .fallback(handlers::method_not_allowed),
        )
        .route(
            "/quotes/random",
            get(handlers::random_quote).fallback(handlers::method_not_allowed),
        )
        .route(
            "/quotes/{id}",
            get(handlers::get_quote)
                .delete(handlers::delete_quote)
                .fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found);

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CompressionLayer::new())
        .layer(middleware::map_response(envelope_timeout))
        .layer(TimeoutLayer::with_status_code(TIMEOUT_STATUS, request_timeout))
        .layer(cors);

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_v1)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let state = AppState::new(Arc::new(LocalRepository::new()));
        let _router = create_router(state, Duration::from_secs(30));
    }
}
