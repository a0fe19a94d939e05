//! Storage port for quote records.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::error::RepositoryResult;
use crate::models::{Quote, QuoteId, StoredQuote};

/// Repository trait for quote persistence.
///
/// Every operation takes the caller's [`CancellationToken`]. Implementations
/// must abort promptly once it fires and must never leave a committed row
/// whose id was not returned to the caller.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Persist a new quote.
    ///
    /// # Returns
    /// * `Ok(QuoteId)` - The identifier generated by the store
    /// * `Err(RepositoryError)` - If the insert fails
    async fn save_quote(
        &self,
        text: &str,
        author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<QuoteId>;

    /// Remove a quote.
    ///
    /// # Returns
    /// * `Ok(())` - The quote existed and was removed
    /// * `Err(RepositoryError::NotFound)` - No quote has this id
    /// * `Err(RepositoryError)` - If the statement fails
    async fn delete_quote(&self, id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<()>;

    /// Fetch a single quote.
    ///
    /// # Returns
    /// * `Ok(Quote)` - The stored quote
    /// * `Err(RepositoryError::NotFound)` - No quote has this id
    async fn get_quote(&self, id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<Quote>;

    /// List every stored quote. No ordering is guaranteed.
    ///
    /// # Returns
    /// * `Ok(Vec<StoredQuote>)` - At least one quote
    /// * `Err(RepositoryError::EmptyResult)` - The store holds no quotes
    async fn list_quotes(&self, cancel: &CancellationToken) -> RepositoryResult<Vec<StoredQuote>>;

    /// List quotes whose author matches `author` exactly.
    ///
    /// # Returns
    /// * `Ok(Vec<StoredQuote>)` - At least one quote
    /// * `Err(RepositoryError::EmptyResult)` - No quote matches
    async fn list_quotes_by_author(
        &self,
        author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Vec<StoredQuote>>;

    /// Pick one stored quote uniformly at random.
    ///
    /// # Returns
    /// * `Ok(Quote)` - The selected quote
    /// * `Err(RepositoryError::EmptyResult)` - The store holds no quotes
    async fn random_quote(&self, cancel: &CancellationToken) -> RepositoryResult<Quote>;

    /// Liveness check against the backing store.
    async fn ping(&self, cancel: &CancellationToken) -> RepositoryResult<()>;

    /// Release all storage resources.
    ///
    /// Calling this on an already closed repository logs a warning and has no
    /// other effect.
    fn close(&self);
}
