//! # Quotes Service
//!
//! A small HTTP service that stores quotes (text and author) and serves
//! create, list, filtered-list, random, lookup and delete operations.
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`models`]: Domain types shared by every layer
//! - [`db`]: Storage port, repository implementations and the repository factory
//! - [`services`]: Validation, business rules and error translation
//! - [`http`]: Axum-based HTTP server and request handlers
//! - [`config`]: Process configuration from the environment
//!
//! ## Features
//!
//! - `local-repo` (default): in-memory storage
//! - `postgres-repo`: PostgreSQL storage via Diesel
//! - `http-server` (default): the REST API and the `quotes-server` binary

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
