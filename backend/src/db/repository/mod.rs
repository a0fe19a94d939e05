//! Repository trait definitions for quote persistence.
//!
//! - [`error`]: Error types for repository operations
//! - [`quotes`]: The storage port consumed by the quote service
//!
//! Implementations live in [`crate::db::repositories`].

pub mod error;
pub mod quotes;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use quotes::QuoteRepository;
