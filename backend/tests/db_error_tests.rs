//! Tests for db::repository::error module.

use quotes_service::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

#[test]
fn test_error_context_new() {
    let ctx = ErrorContext::new("save_quote");
    assert_eq!(ctx.operation, Some("save_quote".to_string()));
    assert!(ctx.entity.is_none());
    assert!(ctx.entity_id.is_none());
    assert!(ctx.details.is_none());
    assert!(!ctx.retryable);
}

#[test]
fn test_error_context_chaining() {
    let ctx = ErrorContext::new("delete_quote")
        .with_entity("quote")
        .with_entity_id(42)
        .with_details("zero rows affected")
        .retryable();

    assert_eq!(ctx.entity, Some("quote".to_string()));
    assert_eq!(ctx.entity_id, Some("42".to_string()));
    assert_eq!(ctx.details, Some("zero rows affected".to_string()));
    assert!(ctx.retryable);
}

#[test]
fn test_error_context_display() {
    let ctx = ErrorContext::new("get_quote")
        .with_entity("quote")
        .with_entity_id("123")
        .retryable();

    let display = ctx.to_string();
    assert!(display.contains("operation=get_quote"));
    assert!(display.contains("entity=quote"));
    assert!(display.contains("id=123"));
    assert!(display.contains("retryable=true"));
}

#[test]
fn test_repository_error_connection_with_context() {
    let ctx = ErrorContext::new("ping").with_entity("database");
    let err = RepositoryError::connection_with_context("failed to connect", ctx);
    let err_str = err.to_string();
    assert!(err_str.contains("Connection error"));
    assert!(err_str.contains("failed to connect"));
    assert!(err_str.contains("operation=ping"));
    assert!(err.is_retryable());
    assert!(err.is_unavailable());
}

#[test]
fn test_not_found_and_empty_result_are_distinct() {
    let not_found = RepositoryError::not_found_with_context(
        "quote not found",
        ErrorContext::new("get_quote").with_entity_id(7),
    );
    let empty = RepositoryError::empty_result("quotes list is empty");

    assert!(not_found.is_not_found());
    assert!(!not_found.is_empty_result());
    assert!(empty.is_empty_result());
    assert!(!empty.is_not_found());
    assert!(!empty.is_unavailable());
}

#[test]
fn test_retryable_classification() {
    assert!(RepositoryError::timeout("pool wait").is_retryable());
    assert!(!RepositoryError::query("syntax error").is_retryable());
    assert!(!RepositoryError::not_found("missing").is_retryable());
    assert!(!RepositoryError::cancelled("list_quotes").is_retryable());
    assert!(!RepositoryError::configuration("bad url").is_retryable());
}

#[test]
fn test_unavailable_classification() {
    assert!(RepositoryError::transaction("commit failed").is_unavailable());
    assert!(RepositoryError::timeout("pool wait").is_unavailable());
    assert!(!RepositoryError::internal("join error").is_unavailable());
    assert!(!RepositoryError::cancelled("save_quote").is_unavailable());
}

#[test]
fn test_repository_error_with_operation() {
    let err = RepositoryError::query("failed").with_operation("list_quotes_by_author");
    assert_eq!(
        err.context().operation.as_deref(),
        Some("list_quotes_by_author")
    );
}

#[test]
fn test_repository_result_err() {
    let result: RepositoryResult<i64> = Err(RepositoryError::cancelled("save_quote"));
    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert!(err.to_string().starts_with("Cancelled"));
}
