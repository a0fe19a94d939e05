//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Repeatable-read transactions for list scans
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL`, `PG_DATABASE_URL` or `DB_CONN_STRING`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)
//!
//! ## Cancellation
//!
//! Diesel is synchronous, so pool checkout and every statement run on the
//! blocking pool. Waiting for a connection and backing off between retries
//! both end as soon as the caller's token fires. Reads also race the running
//! statement against the token; the abandoned task finishes its read-only
//! transaction and hands the connection back. Writes are awaited once they
//! hold a connection, are never re-run after a statement failure, and check
//! the token right before commit, so a cancelled write rolls back.

use async_trait::async_trait;
use diesel::dsl::sql;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_query;
use diesel::sql_types::Double;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info, warn};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task;
use tokio_util::sync::CancellationToken;

use crate::db::repository::{ErrorContext, QuoteRepository, RepositoryError, RepositoryResult};
use crate::models::{Quote, QuoteId, StoredQuote};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;
type PooledConn = PooledConnection<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    ///
    /// See the module documentation for the recognised variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .or_else(|_| std::env::var("DB_CONN_STRING"))
            .map_err(|_| {
                "DATABASE_URL, PG_DATABASE_URL or DB_CONN_STRING must be set".to_string()
            })?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
            max_retries: env_or("PG_MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_or("PG_RETRY_DELAY_MS", defaults.retry_delay_ms),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed quote repository for Postgres.
///
/// The pool lives behind a lock so [`QuoteRepository::close`] can release it;
/// every operation after close fails with a connection error.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: Arc<RwLock<Option<PgPool>>>,
    config: PostgresConfig,
    // Metrics counters
    total_queries: Arc<AtomicU64>,
    failed_queries: Arc<AtomicU64>,
    retried_operations: Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// # Returns
    /// * `Ok(PostgresRepository)` on success
    /// * `Err(RepositoryError)` if connection or migration fails
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        debug!("Connecting to database");
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        info!(
            "Database is connected (max_pool_size={})",
            config.max_pool_size
        );

        Ok(Self {
            pool: Arc::new(RwLock::new(Some(pool))),
            config,
            total_queries: Arc::new(AtomicU64::new(0)),
            failed_queries: Arc::new(AtomicU64::new(0)),
            retried_operations: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        if applied.is_empty() {
            debug!("No pending migrations");
        } else {
            info!("Applied {} migration(s)", applied.len());
        }
        Ok(())
    }

    fn pool(&self, operation: &str) -> RepositoryResult<PgPool> {
        self.pool.read().clone().ok_or_else(|| {
            RepositoryError::connection_with_context(
                "Repository is closed",
                ErrorContext::new(operation),
            )
        })
    }

    fn join_result<T>(
        joined: Result<RepositoryResult<T>, task::JoinError>,
    ) -> RepositoryResult<T> {
        joined.map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Check a connection out of the pool on the blocking pool.
    ///
    /// Returns as soon as the token fires. A connection that arrives after
    /// that is dropped by the abandoned task and goes back to the pool.
    async fn checkout(
        pool: &PgPool,
        operation: &'static str,
        attempt: u32,
        cancel: &CancellationToken,
    ) -> RepositoryResult<PooledConn> {
        let pool = pool.clone();
        let handle = task::spawn_blocking(move || {
            pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new(operation).with_details(format!("attempt={}", attempt + 1)),
                )
            })
        });

        tokio::select! {
            joined = handle => Self::join_result(joined),
            _ = cancel.cancelled() => {
                debug!("{} cancelled while waiting for a connection", operation);
                Err(RepositoryError::cancelled(operation))
            }
        }
    }

    /// Run `f` on a pooled connection with exponential backoff for transient
    /// failures. The token is honoured while waiting for a connection and
    /// between attempts.
    ///
    /// An `idempotent` operation also retries failed statements and returns as
    /// soon as the token fires, leaving the blocking task to finish on its own.
    /// Otherwise only checkout failures are retried and a running statement is
    /// awaited, so one call never applies its write twice.
    async fn run_with_retry<T, F>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        idempotent: bool,
        f: F,
    ) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection, &CancellationToken) -> RepositoryResult<T>
            + Send
            + 'static
            + Clone,
    {
        let pool = self.pool(operation)?;
        let max_retries = self.config.max_retries;
        let mut retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let mut last_error = None;

        for attempt in 0..=max_retries {
            if attempt > 0 {
                self.retried_operations.fetch_add(1, Ordering::Relaxed);
                tokio::select! {
                    _ = tokio::time::sleep(retry_delay) => {}
                    _ = cancel.cancelled() => return Err(RepositoryError::cancelled(operation)),
                }
                retry_delay *= 2; // Exponential backoff
            }

            if cancel.is_cancelled() {
                return Err(RepositoryError::cancelled(operation));
            }

            let mut conn = match Self::checkout(&pool, operation, attempt, cancel).await {
                Ok(conn) => conn,
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    warn!("{} could not get a connection on attempt {}: {}", operation, attempt + 1, e);
                    last_error = Some(e);
                    continue;
                }
                Err(e) => {
                    if !e.is_cancelled() {
                        self.failed_queries.fetch_add(1, Ordering::Relaxed);
                    }
                    return Err(e);
                }
            };

            self.total_queries.fetch_add(1, Ordering::Relaxed);
            let f = f.clone();
            let task_cancel = cancel.clone();
            let handle = task::spawn_blocking(move || f(&mut conn, &task_cancel));

            let outcome = if idempotent {
                tokio::select! {
                    joined = handle => Self::join_result(joined),
                    _ = cancel.cancelled() => {
                        debug!("{} cancelled, abandoning blocking task", operation);
                        return Err(RepositoryError::cancelled(operation));
                    }
                }
            } else {
                Self::join_result(handle.await)
            };

            match outcome {
                Ok(result) => return Ok(result),
                Err(e) if retry_statement(idempotent, &e, attempt, max_retries) => {
                    warn!("{} failed on attempt {}, retrying: {}", operation, attempt + 1, e);
                    last_error = Some(e);
                }
                Err(e) => {
                    if !(e.is_not_found() || e.is_empty_result() || e.is_cancelled()) {
                        self.failed_queries.fetch_add(1, Ordering::Relaxed);
                    }
                    return Err(e.with_operation(operation));
                }
            }
        }

        self.failed_queries.fetch_add(1, Ordering::Relaxed);
        Err(last_error.unwrap_or_else(|| {
            RepositoryError::internal("Max retries exceeded with no error captured")
        }))
    }

    /// Run a read operation, returning as soon as the caller cancels.
    async fn with_conn<T, F>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        f: F,
    ) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection, &CancellationToken) -> RepositoryResult<T>
            + Send
            + 'static
            + Clone,
    {
        self.run_with_retry(operation, cancel, true, f).await
    }

    /// Run a write operation. Cancellation is prompt until a connection is
    /// acquired; after that the closure runs to completion and is responsible
    /// for checking the token before it commits.
    async fn with_conn_to_completion<T, F>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        f: F,
    ) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection, &CancellationToken) -> RepositoryResult<T>
            + Send
            + 'static
            + Clone,
    {
        self.run_with_retry(operation, cancel, false, f).await
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let guard = self.pool.read();
        let (connections, idle) = match guard.as_ref() {
            Some(pool) => {
                let state = pool.state();
                (state.connections, state.idle_connections)
            }
            None => (0, 0),
        };
        PoolStats {
            connections_in_use: connections - idle,
            idle_connections: idle,
            total_connections: connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.ping(&CancellationToken::new()).await {
            Ok(()) => (true, Some(start.elapsed().as_millis() as u64), None),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

/// Whether a failed statement may run again. A write whose connection drops
/// mid-commit may already be applied, so only idempotent work is re-run.
fn retry_statement(idempotent: bool, err: &RepositoryError, attempt: u32, max_retries: u32) -> bool {
    idempotent && err.is_retryable() && attempt < max_retries
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err)
}

fn rows_or_empty(
    rows: Vec<QuoteRow>,
    context: ErrorContext,
) -> RepositoryResult<Vec<StoredQuote>> {
    if rows.is_empty() {
        info!("quotes list is empty {}", context);
        return Err(RepositoryError::empty_result_with_context(
            "quotes list is empty",
            context,
        ));
    }
    Ok(rows.into_iter().map(StoredQuote::from).collect())
}

#[async_trait]
impl QuoteRepository for PostgresRepository {
    async fn save_quote(
        &self,
        text: &str,
        author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<QuoteId> {
        let new_row = NewQuoteRow {
            quote: text.to_string(),
            author: author.to_string(),
        };

        let id = self
            .with_conn_to_completion("save_quote", cancel, move |conn, cancel| {
                conn.transaction(|tx| {
                    let id: i64 = diesel::insert_into(quotes::table)
                        .values(&new_row)
                        .returning(quotes::id)
                        .get_result(tx)
                        .map_err(map_diesel_error)?;

                    if cancel.is_cancelled() {
                        return Err(RepositoryError::cancelled("save_quote"));
                    }
                    Ok(QuoteId(id))
                })
            })
            .await?;

        debug!("Quote saved successfully: id={}, author={}", id, author);
        Ok(id)
    }

    async fn delete_quote(&self, id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<()> {
        self.with_conn_to_completion("delete_quote", cancel, move |conn, cancel| {
            conn.transaction(|tx| {
                let deleted = diesel::delete(quotes::table.filter(quotes::id.eq(id.0)))
                    .execute(tx)
                    .map_err(map_diesel_error)?;

                if deleted == 0 {
                    warn!("Quote not found: id={}", id);
                    return Err(RepositoryError::not_found_with_context(
                        "quote not found",
                        ErrorContext::new("delete_quote")
                            .with_entity("quote")
                            .with_entity_id(id),
                    ));
                }
                if cancel.is_cancelled() {
                    return Err(RepositoryError::cancelled("delete_quote"));
                }
                Ok(())
            })
        })
        .await?;

        debug!("Quote deleted successfully: id={}", id);
        Ok(())
    }

    async fn get_quote(&self, id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<Quote> {
        self.with_conn("get_quote", cancel, move |conn, _cancel| {
            let row = quotes::table
                .find(id.0)
                .select(QuoteRow::as_select())
                .first::<QuoteRow>(conn)
                .optional()
                .map_err(map_diesel_error)?;

            row.map(|r| Quote::new(r.quote, r.author)).ok_or_else(|| {
                RepositoryError::not_found_with_context(
                    "quote not found",
                    ErrorContext::new("get_quote")
                        .with_entity("quote")
                        .with_entity_id(id),
                )
            })
        })
        .await
    }

    async fn list_quotes(&self, cancel: &CancellationToken) -> RepositoryResult<Vec<StoredQuote>> {
        let rows = self
            .with_conn("list_quotes", cancel, |conn, cancel| {
                conn.build_transaction()
                    .repeatable_read()
                    .read_only()
                    .run(|tx| {
                        let rows = quotes::table
                            .select(QuoteRow::as_select())
                            .load::<QuoteRow>(tx)
                            .map_err(map_diesel_error)?;
                        if cancel.is_cancelled() {
                            return Err(RepositoryError::cancelled("list_quotes"));
                        }
                        Ok(rows)
                    })
            })
            .await?;

        rows_or_empty(rows, ErrorContext::new("list_quotes"))
    }

    async fn list_quotes_by_author(
        &self,
        author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Vec<StoredQuote>> {
        let author = author.to_string();
        let filter = author.clone();
        let rows = self
            .with_conn("list_quotes_by_author", cancel, move |conn, cancel| {
                conn.build_transaction()
                    .repeatable_read()
                    .read_only()
                    .run(|tx| {
                        let rows = quotes::table
                            .filter(quotes::author.eq(&filter))
                            .select(QuoteRow::as_select())
                            .load::<QuoteRow>(tx)
                            .map_err(map_diesel_error)?;
                        if cancel.is_cancelled() {
                            return Err(RepositoryError::cancelled("list_quotes_by_author"));
                        }
                        Ok(rows)
                    })
            })
            .await?;

        rows_or_empty(
            rows,
            ErrorContext::new("list_quotes_by_author").with_details(format!("author={}", author)),
        )
    }

    async fn random_quote(&self, cancel: &CancellationToken) -> RepositoryResult<Quote> {
        self.with_conn("random_quote", cancel, |conn, _cancel| {
            let row = quotes::table
                .select((quotes::quote, quotes::author))
                .order(sql::<Double>("RANDOM()"))
                .first::<(String, String)>(conn)
                .optional()
                .map_err(map_diesel_error)?;

            row.map(|(text, author)| Quote::new(text, author))
                .ok_or_else(|| {
                    RepositoryError::empty_result_with_context(
                        "quotes list is empty",
                        ErrorContext::new("random_quote"),
                    )
                })
        })
        .await
    }

    async fn ping(&self, cancel: &CancellationToken) -> RepositoryResult<()> {
        self.with_conn("ping", cancel, |conn, _cancel| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await?;

        debug!("Database ping successful");
        Ok(())
    }

    fn close(&self) {
        match self.pool.write().take() {
            Some(pool) => {
                let state = pool.state();
                debug!(
                    "Closing database connection pool ({} connections, {} idle)",
                    state.connections, state.idle_connections
                );
                drop(pool);
                info!("Database connection pool closed");
            }
            None => warn!("No database connection to close"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    fn closed_connection() -> RepositoryError {
        map_diesel_error(DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection unexpectedly".to_string()),
        ))
    }

    #[test]
    fn test_dropped_connection_retries_reads_only() {
        let err = closed_connection();
        assert!(err.is_retryable());

        assert!(retry_statement(true, &err, 0, 3));
        assert!(!retry_statement(false, &err, 0, 3));
        assert!(!retry_statement(true, &err, 3, 3));
    }

    #[test]
    fn test_permanent_errors_are_not_retried() {
        let err = RepositoryError::query("syntax error");
        assert!(!retry_statement(true, &err, 0, 3));
        assert!(!retry_statement(true, &RepositoryError::cancelled("list_quotes"), 0, 3));
    }
}
