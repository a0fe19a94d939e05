//! Quote domain types shared by the service, storage and HTTP layers.

use serde::{Deserialize, Serialize};

/// Storage-assigned quote identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(pub i64);

impl QuoteId {
    pub fn new(value: i64) -> Self {
        QuoteId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for QuoteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A quote as supplied by clients and returned by random/single lookups.
///
/// Older clients send the text under the `quote` key, which is still accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub author: String,
    #[serde(alias = "quote")]
    pub text: String,
}

impl Quote {
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
        }
    }
}

/// A persisted quote together with its storage-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQuote {
    pub id: QuoteId,
    #[serde(flatten)]
    pub quote: Quote,
}

impl StoredQuote {
    pub fn new(id: QuoteId, quote: Quote) -> Self {
        Self { id, quote }
    }

    pub fn author(&self) -> &str {
        &self.quote.author
    }

    pub fn text(&self) -> &str {
        &self.quote.text
    }
}
