//! Field validation for incoming quotes.
//!
//! [`QuoteValidator`] is an explicit value held by the service rather than a
//! process-wide instance. Each field is checked against its rules in order
//! (required, minimum length, maximum length, printable ASCII) and only the
//! first rule a field breaks is reported.

use std::fmt;

use crate::models::Quote;

/// Minimum number of characters in an author name.
pub const AUTHOR_MIN_LEN: usize = 3;
/// Maximum number of characters in an author name.
pub const AUTHOR_MAX_LEN: usize = 100;
/// Minimum number of characters in a quote text.
pub const TEXT_MIN_LEN: usize = 3;
/// Maximum number of characters in a quote text.
pub const TEXT_MAX_LEN: usize = 500;

/// A rule a field can break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    MinLength(usize),
    MaxLength(usize),
    PrintableAscii,
}

/// One violated rule on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub rule: Rule,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule {
            Rule::Required => write!(f, "{} cannot be empty", self.field),
            Rule::MinLength(n) => {
                write!(f, "{} must be at least {} characters long", self.field, n)
            }
            Rule::MaxLength(n) => write!(f, "{} length exceeds {} characters", self.field, n),
            Rule::PrintableAscii => write!(f, "{} contains invalid characters", self.field),
        }
    }
}

/// Every violation found on a quote, in field order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", self.message())]
pub struct ValidationErrors {
    violations: Vec<FieldViolation>,
}

impl ValidationErrors {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Whether `field` broke any rule.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    /// Human-readable aggregate, e.g.
    /// `Author cannot be empty; Text contains invalid characters`.
    pub fn message(&self) -> String {
        self.violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Length and character constraints for one string field.
#[derive(Debug, Clone, Copy)]
struct FieldRules {
    name: &'static str,
    min: usize,
    max: usize,
}

impl FieldRules {
    fn check(&self, value: &str) -> Option<FieldViolation> {
        let rule = if value.is_empty() {
            Rule::Required
        } else {
            let len = value.chars().count();
            if len < self.min {
                Rule::MinLength(self.min)
            } else if len > self.max {
                Rule::MaxLength(self.max)
            } else if !value.chars().all(is_printable_ascii) {
                Rule::PrintableAscii
            } else {
                return None;
            }
        };

        Some(FieldViolation {
            field: self.name,
            rule,
        })
    }
}

fn is_printable_ascii(c: char) -> bool {
    matches!(c, ' '..='~')
}

/// Validates quotes before they reach storage.
#[derive(Debug, Clone)]
pub struct QuoteValidator {
    author: FieldRules,
    text: FieldRules,
}

impl Default for QuoteValidator {
    fn default() -> Self {
        Self {
            author: FieldRules {
                name: "Author",
                min: AUTHOR_MIN_LEN,
                max: AUTHOR_MAX_LEN,
            },
            text: FieldRules {
                name: "Text",
                min: TEXT_MIN_LEN,
                max: TEXT_MAX_LEN,
            },
        }
    }
}

impl QuoteValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check every field of `quote`, collecting all violations.
    pub fn validate(&self, quote: &Quote) -> Result<(), ValidationErrors> {
        let violations: Vec<_> = [
            self.author.check(&quote.author),
            self.text.check(&quote.text),
        ]
        .into_iter()
        .flatten()
        .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { violations })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate(text: &str, author: &str) -> Result<(), ValidationErrors> {
        QuoteValidator::new().validate(&Quote::new(text, author))
    }

    #[test]
    fn test_valid_quote_passes() {
        assert!(validate("Some quote", "Jane Doe").is_ok());
        assert!(validate("abc", "Ann").is_ok());
        assert!(validate(&"x".repeat(TEXT_MAX_LEN), &"y".repeat(AUTHOR_MAX_LEN)).is_ok());
    }

    #[test]
    fn test_empty_fields_report_required_only() {
        let err = validate("", "").unwrap_err();
        assert_eq!(
            err.violations(),
            &[
                FieldViolation {
                    field: "Author",
                    rule: Rule::Required
                },
                FieldViolation {
                    field: "Text",
                    rule: Rule::Required
                },
            ]
        );
        assert_eq!(err.message(), "Author cannot be empty; Text cannot be empty");
    }

    #[test]
    fn test_length_bounds() {
        let err = validate("Some quote", "Al").unwrap_err();
        assert_eq!(err.violations()[0].rule, Rule::MinLength(AUTHOR_MIN_LEN));
        assert_eq!(
            err.to_string(),
            "Author must be at least 3 characters long"
        );

        let err = validate(&"x".repeat(TEXT_MAX_LEN + 1), "Jane Doe").unwrap_err();
        assert!(err.has_field("Text"));
        assert!(!err.has_field("Author"));
        assert_eq!(err.to_string(), "Text length exceeds 500 characters");
    }

    #[test]
    fn test_non_ascii_is_rejected() {
        let err = validate("Caf\u{e9} au lait", "Jane Doe").unwrap_err();
        assert_eq!(err.violations()[0].rule, Rule::PrintableAscii);

        let err = validate("line\nbreak", "Jane Doe").unwrap_err();
        assert_eq!(err.to_string(), "Text contains invalid characters");
    }

    #[test]
    fn test_length_is_counted_in_characters() {
        // Two characters, four bytes: too short rather than non-ASCII.
        let err = validate("Some quote", "\u{e9}\u{e9}").unwrap_err();
        assert_eq!(err.violations()[0].rule, Rule::MinLength(AUTHOR_MIN_LEN));
    }
}
