//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::QuoteRepository;
use crate::services::QuoteService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Quote use cases
    pub quotes: QuoteService,
}

impl AppState {
    /// Create a new application state over the given repository.
    pub fn new(repository: Arc<dyn QuoteRepository>) -> Self {
        Self {
            quotes: QuoteService::new(repository),
        }
    }

    pub fn with_service(quotes: QuoteService) -> Self {
        Self { quotes }
    }
}
