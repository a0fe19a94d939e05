//! In-memory local repository implementation.
//!
//! This module provides a local implementation of [`QuoteRepository`]
//! suitable for unit testing and local development. All data is stored in a
//! `BTreeMap` behind a lock, giving fast, deterministic and isolated execution.

use async_trait::async_trait;
use log::{debug, warn};
use parking_lot::RwLock;
use rand::seq::IteratorRandom;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::db::repository::{ErrorContext, QuoteRepository, RepositoryError, RepositoryResult};
use crate::models::{Quote, QuoteId, StoredQuote};

/// In-memory local repository.
///
/// Ids come from a counter that is never rewound, so ids of deleted quotes
/// are not handed out again.
///
/// # Example
/// ```
/// use quotes_service::db::repositories::LocalRepository;
/// use quotes_service::db::QuoteRepository;
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let repo = LocalRepository::new();
/// let cancel = CancellationToken::new();
/// let id = repo.save_quote("Some quote", "Jane Doe", &cancel).await.unwrap();
/// let quote = repo.get_quote(id, &cancel).await.unwrap();
/// assert_eq!(quote.author, "Jane Doe");
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    quotes: BTreeMap<QuoteId, Quote>,
    next_quote_id: QuoteId,
    // Connection health
    is_healthy: bool,
    is_closed: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            quotes: BTreeMap::new(),
            next_quote_id: QuoteId(1),
            is_healthy: true,
            is_closed: false,
        }
    }
}

impl LocalData {
    fn ensure_available(&self, operation: &str) -> RepositoryResult<()> {
        if self.is_closed {
            return Err(RepositoryError::connection_with_context(
                "Repository is closed",
                ErrorContext::new(operation),
            ));
        }
        if !self.is_healthy {
            return Err(RepositoryError::connection_with_context(
                "Local repository is marked unhealthy",
                ErrorContext::new(operation),
            ));
        }
        Ok(())
    }

    fn stored(&self) -> impl Iterator<Item = StoredQuote> + '_ {
        self.quotes
            .iter()
            .map(|(id, quote)| StoredQuote::new(*id, quote.clone()))
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all quotes. The id counter keeps advancing.
    pub fn clear(&self) {
        self.data.write().quotes.clear();
    }

    /// Get the number of quotes stored.
    pub fn quote_count(&self) -> usize {
        self.data.read().quotes.len()
    }

    /// Check if a quote exists.
    pub fn has_quote(&self, id: QuoteId) -> bool {
        self.data.read().quotes.contains_key(&id)
    }

    /// Whether [`QuoteRepository::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.data.read().is_closed
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn check_cancelled(cancel: &CancellationToken, operation: &str) -> RepositoryResult<()> {
    if cancel.is_cancelled() {
        return Err(RepositoryError::cancelled(operation));
    }
    Ok(())
}

fn empty_unless_any(
    quotes: Vec<StoredQuote>,
    context: ErrorContext,
) -> RepositoryResult<Vec<StoredQuote>> {
    if quotes.is_empty() {
        return Err(RepositoryError::empty_result_with_context(
            "quotes list is empty",
            context,
        ));
    }
    Ok(quotes)
}

#[async_trait]
impl QuoteRepository for LocalRepository {
    async fn save_quote(
        &self,
        text: &str,
        author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<QuoteId> {
        check_cancelled(cancel, "save_quote")?;
        let mut data = self.data.write();
        data.ensure_available("save_quote")?;

        let id = data.next_quote_id;
        data.next_quote_id = QuoteId(id.0 + 1);
        data.quotes.insert(id, Quote::new(text, author));

        debug!("Quote saved: id={}, author={}", id, author);
        Ok(id)
    }

    async fn delete_quote(&self, id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<()> {
        check_cancelled(cancel, "delete_quote")?;
        let mut data = self.data.write();
        data.ensure_available("delete_quote")?;

        match data.quotes.remove(&id) {
            Some(_) => {
                debug!("Quote deleted: id={}", id);
                Ok(())
            }
            None => {
                warn!("Quote not found: id={}", id);
                Err(RepositoryError::not_found_with_context(
                    "quote not found",
                    ErrorContext::new("delete_quote")
                        .with_entity("quote")
                        .with_entity_id(id),
                ))
            }
        }
    }

    async fn get_quote(&self, id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<Quote> {
        check_cancelled(cancel, "get_quote")?;
        let data = self.data.read();
        data.ensure_available("get_quote")?;

        data.quotes.get(&id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "quote not found",
                ErrorContext::new("get_quote")
                    .with_entity("quote")
                    .with_entity_id(id),
            )
        })
    }

    async fn list_quotes(&self, cancel: &CancellationToken) -> RepositoryResult<Vec<StoredQuote>> {
        check_cancelled(cancel, "list_quotes")?;
        let data = self.data.read();
        data.ensure_available("list_quotes")?;

        empty_unless_any(data.stored().collect(), ErrorContext::new("list_quotes"))
    }

    async fn list_quotes_by_author(
        &self,
        author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Vec<StoredQuote>> {
        check_cancelled(cancel, "list_quotes_by_author")?;
        let data = self.data.read();
        data.ensure_available("list_quotes_by_author")?;

        let quotes = data.stored().filter(|q| q.author() == author).collect();
        empty_unless_any(
            quotes,
            ErrorContext::new("list_quotes_by_author").with_details(format!("author={}", author)),
        )
    }

    async fn random_quote(&self, cancel: &CancellationToken) -> RepositoryResult<Quote> {
        check_cancelled(cancel, "random_quote")?;
        let data = self.data.read();
        data.ensure_available("random_quote")?;

        data.quotes
            .values()
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| {
                RepositoryError::empty_result_with_context(
                    "quotes list is empty",
                    ErrorContext::new("random_quote"),
                )
            })
    }

    async fn ping(&self, cancel: &CancellationToken) -> RepositoryResult<()> {
        check_cancelled(cancel, "ping")?;
        self.data.read().ensure_available("ping")
    }

    fn close(&self) {
        let mut data = self.data.write();
        if data.is_closed {
            warn!("No storage connection to close");
            return;
        }
        data.is_closed = true;
        debug!("Local repository closed");
    }
}
