//! Quote use cases.
//!
//! [`QuoteService`] validates input, delegates to a [`QuoteRepository`] and
//! translates storage errors into [`ServiceError`] sentinels. It keeps no
//! per-request state and can be shared freely across tasks.

use std::sync::Arc;

use log::{debug, error};
use tokio_util::sync::CancellationToken;

use crate::db::{QuoteRepository, RepositoryError, RepositoryResult};
use crate::models::{Quote, QuoteId, StoredQuote};

use super::error::ServiceError;
use super::validation::QuoteValidator;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Author filters shorter than this are rejected before reaching storage.
pub const AUTHOR_FILTER_MIN_LEN: usize = 2;

#[derive(Clone)]
pub struct QuoteService {
    repository: Arc<dyn QuoteRepository>,
    validator: QuoteValidator,
}

impl QuoteService {
    pub fn new(repository: Arc<dyn QuoteRepository>) -> Self {
        Self::with_validator(repository, QuoteValidator::new())
    }

    pub fn with_validator(repository: Arc<dyn QuoteRepository>, validator: QuoteValidator) -> Self {
        Self {
            repository,
            validator,
        }
    }

    pub fn repository(&self) -> &Arc<dyn QuoteRepository> {
        &self.repository
    }

    /// Validate and persist a quote, returning the id storage assigned.
    pub async fn save(
        &self,
        quote: Option<Quote>,
        cancel: &CancellationToken,
    ) -> ServiceResult<QuoteId> {
        let Some(quote) = quote else {
            error!("{}", ServiceError::QuoteIsNil);
            return Err(ServiceError::QuoteIsNil);
        };
        debug!("Saving quote: author={}", quote.author);

        if let Err(violations) = self.validator.validate(&quote) {
            error!("Quote validation failed: {}", violations);
            return Err(ServiceError::ValidationFailed(violations));
        }

        let id = self
            .repository
            .save_quote(&quote.text, &quote.author, cancel)
            .await
            .map_err(|source| {
                error!("Failed to save quote: {}", source);
                ServiceError::SaveFailed { source }
            })?;

        debug!("Quote saved successfully: id={}", id);
        Ok(id)
    }

    pub async fn delete(&self, id: &str, cancel: &CancellationToken) -> ServiceResult<()> {
        debug!("Deleting quote: id={}", id);
        let quote_id = parse_quote_id(id)?;

        self.repository
            .delete_quote(quote_id, cancel)
            .await
            .map_err(|source| {
                error!("Failed to delete quote {}: {}", quote_id, source);
                ServiceError::DeleteFailed { source }
            })?;

        debug!("Quote deleted successfully: id={}", quote_id);
        Ok(())
    }

    pub async fn get(&self, id: &str, cancel: &CancellationToken) -> ServiceResult<Quote> {
        debug!("Getting quote: id={}", id);
        let quote_id = parse_quote_id(id)?;

        match self.repository.get_quote(quote_id, cancel).await {
            Ok(quote) => Ok(quote),
            Err(source) if source.is_not_found() => {
                debug!("Quote not found: id={}", quote_id);
                Err(ServiceError::NotFound {
                    id: quote_id,
                    source,
                })
            }
            Err(source) => {
                error!("Failed to get quote {}: {}", quote_id, source);
                Err(ServiceError::GetFailed { source })
            }
        }
    }

    /// All stored quotes. An empty store yields [`ServiceError::EmptyResult`].
    pub async fn list(&self, cancel: &CancellationToken) -> ServiceResult<Vec<StoredQuote>> {
        debug!("Listing all quotes");
        let quotes = self
            .repository
            .list_quotes(cancel)
            .await
            .map_err(read_failure)?;

        debug!("Quotes retrieved successfully: count={}", quotes.len());
        Ok(quotes)
    }

    pub async fn list_by_author(
        &self,
        author: &str,
        cancel: &CancellationToken,
    ) -> ServiceResult<Vec<StoredQuote>> {
        debug!("Listing quotes by author: author={}", author);

        if author.chars().count() < AUTHOR_FILTER_MIN_LEN {
            error!("Invalid author name: {:?}", author);
            return Err(ServiceError::InvalidAuthorName {
                author: author.to_string(),
            });
        }

        let quotes = self
            .repository
            .list_quotes_by_author(author, cancel)
            .await
            .map_err(read_failure)?;

        debug!("Quotes retrieved successfully: count={}", quotes.len());
        Ok(quotes)
    }

    pub async fn random(&self, cancel: &CancellationToken) -> ServiceResult<Quote> {
        debug!("Getting random quote");
        self.repository
            .random_quote(cancel)
            .await
            .map_err(read_failure)
    }

    /// Liveness of the underlying storage.
    pub async fn ping(&self, cancel: &CancellationToken) -> RepositoryResult<()> {
        self.repository.ping(cancel).await
    }
}

fn read_failure(source: RepositoryError) -> ServiceError {
    if source.is_empty_result() {
        debug!("Query returned no quotes");
        return ServiceError::EmptyResult { source };
    }
    error!("Failed to get quotes: {}", source);
    ServiceError::GetFailed { source }
}

/// Parse a client-supplied id: non-empty, base 10, strictly positive.
pub fn parse_quote_id(id: &str) -> ServiceResult<QuoteId> {
    match id.parse::<i64>() {
        Ok(value) if value > 0 => Ok(QuoteId::new(value)),
        _ => {
            error!("Invalid quote ID: {:?}", id);
            Err(ServiceError::InvalidQuoteId { id: id.to_string() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::LocalRepository;

    fn service() -> (QuoteService, LocalRepository) {
        let repo = LocalRepository::new();
        (QuoteService::new(Arc::new(repo.clone())), repo)
    }

    #[test]
    fn test_parse_quote_id() {
        assert_eq!(parse_quote_id("1").unwrap(), QuoteId(1));
        assert_eq!(parse_quote_id("9876543210").unwrap(), QuoteId(9_876_543_210));
        for bad in ["", "abc", "0", "-3", "1.5", " 1", "99999999999999999999"] {
            assert!(
                matches!(parse_quote_id(bad), Err(ServiceError::InvalidQuoteId { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found_unwrapped() {
        let (service, _) = service();
        let err = service
            .get("5", &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { id: QuoteId(5), .. }));
    }

    #[tokio::test]
    async fn test_random_on_empty_store_is_empty_result() {
        let (service, _) = service();
        let err = service.random(&CancellationToken::new()).await.unwrap_err();
        assert!(err.is_empty_result());
    }

    #[tokio::test]
    async fn test_unhealthy_storage_wraps_as_get_failed() {
        let (service, repo) = service();
        repo.set_healthy(false);
        let err = service.list(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ServiceError::GetFailed { .. }));
        assert!(service.ping(&CancellationToken::new()).await.is_err());
    }
}
