//! Errors returned by the quote service.
//!
//! Each variant is a stable sentinel. Storage failures stay reachable through
//! [`std::error::Error::source`], so callers classify with [`ServiceError::kind`]
//! or the `is_*` helpers instead of matching on text.

use crate::db::RepositoryError;
use crate::models::QuoteId;

use super::validation::ValidationErrors;

/// Coarse classification used by transports to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed request input.
    InputInvalid,
    /// One or more field rules were broken.
    ValidationFailed,
    /// A specifically identified quote does not exist.
    NotFound,
    /// A query matched nothing. Not a failure from the caller's point of view.
    EmptyResult,
    /// Storage could not be reached or a transaction failed.
    StorageUnavailable,
    /// Anything else.
    InternalFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("quote is nil")]
    QuoteIsNil,

    #[error("validation failed for quote: {0}")]
    ValidationFailed(ValidationErrors),

    #[error("invalid quote ID, must be a positive integer: {id}")]
    InvalidQuoteId { id: String },

    #[error("invalid author name, must be at least 2 characters long: {author}")]
    InvalidAuthorName { author: String },

    #[error("quote not found: {id}")]
    NotFound {
        id: QuoteId,
        #[source]
        source: RepositoryError,
    },

    #[error("no quotes found")]
    EmptyResult {
        #[source]
        source: RepositoryError,
    },

    #[error("failed to save quote")]
    SaveFailed {
        #[source]
        source: RepositoryError,
    },

    #[error("failed to delete quote")]
    DeleteFailed {
        #[source]
        source: RepositoryError,
    },

    #[error("failed to get quote")]
    GetFailed {
        #[source]
        source: RepositoryError,
    },
}

impl ServiceError {
    /// The storage error underneath, if any.
    pub fn repository_error(&self) -> Option<&RepositoryError> {
        match self {
            Self::NotFound { source, .. }
            | Self::EmptyResult { source }
            | Self::SaveFailed { source }
            | Self::DeleteFailed { source }
            | Self::GetFailed { source } => Some(source),
            _ => None,
        }
    }

    /// True for a direct `NotFound` and for a failure caused by one, such as
    /// deleting an id that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
            || self
                .repository_error()
                .is_some_and(RepositoryError::is_not_found)
    }

    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        if self.is_not_found() {
            return ErrorKind::NotFound;
        }

        match self {
            Self::QuoteIsNil | Self::InvalidQuoteId { .. } | Self::InvalidAuthorName { .. } => {
                ErrorKind::InputInvalid
            }
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::EmptyResult { .. } => ErrorKind::EmptyResult,
            _ => match self.repository_error() {
                Some(err) if err.is_unavailable() => ErrorKind::StorageUnavailable,
                _ => ErrorKind::InternalFailure,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_delete_of_missing_quote_is_both_failure_and_not_found() {
        let err = ServiceError::DeleteFailed {
            source: RepositoryError::not_found("quote not found"),
        };
        assert!(err.is_not_found());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "failed to delete quote");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(ServiceError::QuoteIsNil.kind(), ErrorKind::InputInvalid);
        assert_eq!(
            ServiceError::InvalidQuoteId { id: "abc".into() }.kind(),
            ErrorKind::InputInvalid
        );
        assert_eq!(
            ServiceError::EmptyResult {
                source: RepositoryError::empty_result("none"),
            }
            .kind(),
            ErrorKind::EmptyResult
        );
        assert_eq!(
            ServiceError::GetFailed {
                source: RepositoryError::connection("refused"),
            }
            .kind(),
            ErrorKind::StorageUnavailable
        );
        assert_eq!(
            ServiceError::SaveFailed {
                source: RepositoryError::query("syntax"),
            }
            .kind(),
            ErrorKind::InternalFailure
        );
    }
}
