//! Service layer for business rules.
//!
//! This module sits between the HTTP handlers and the repository layer.
//! Services validate input, call storage and translate storage errors into
//! domain errors the transport can classify.

pub mod error;
pub mod health;
pub mod quotes;
pub mod validation;

pub use error::{ErrorKind, ServiceError};
pub use health::monitor_storage;
pub use quotes::{parse_quote_id, QuoteService, ServiceResult};
pub use validation::{FieldViolation, QuoteValidator, Rule, ValidationErrors};
