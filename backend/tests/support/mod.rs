#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use quotes_service::db::{LocalRepository, QuoteRepository, RepositoryError, RepositoryResult};
use quotes_service::models::{Quote, QuoteId, StoredQuote};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// Environment with every storage selector cleared.
pub const NO_STORAGE_ENV: [(&str, Option<&str>); 4] = [
    ("REPOSITORY_TYPE", None),
    ("DATABASE_URL", None),
    ("PG_DATABASE_URL", None),
    ("DB_CONN_STRING", None),
];

pub fn token() -> CancellationToken {
    CancellationToken::new()
}

pub fn quote(text: &str, author: &str) -> Quote {
    Quote::new(text, author)
}

/// Store `quotes` as `(text, author)` pairs and return their ids in order.
pub async fn seed(repo: &dyn QuoteRepository, quotes: &[(&str, &str)]) -> Vec<QuoteId> {
    let mut ids = Vec::with_capacity(quotes.len());
    for (text, author) in quotes {
        ids.push(repo.save_quote(text, author, &token()).await.unwrap());
    }
    ids
}

/// Local repository that counts every storage call it receives.
#[derive(Default)]
pub struct CountingRepository {
    pub inner: LocalRepository,
    calls: AtomicUsize,
}

impl CountingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl QuoteRepository for CountingRepository {
    async fn save_quote(
        &self,
        text: &str,
        author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<QuoteId> {
        self.hit();
        self.inner.save_quote(text, author, cancel).await
    }

    async fn delete_quote(&self, id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<()> {
        self.hit();
        self.inner.delete_quote(id, cancel).await
    }

    async fn get_quote(&self, id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<Quote> {
        self.hit();
        self.inner.get_quote(id, cancel).await
    }

    async fn list_quotes(&self, cancel: &CancellationToken) -> RepositoryResult<Vec<StoredQuote>> {
        self.hit();
        self.inner.list_quotes(cancel).await
    }

    async fn list_quotes_by_author(
        &self,
        author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Vec<StoredQuote>> {
        self.hit();
        self.inner.list_quotes_by_author(author, cancel).await
    }

    async fn random_quote(&self, cancel: &CancellationToken) -> RepositoryResult<Quote> {
        self.hit();
        self.inner.random_quote(cancel).await
    }

    async fn ping(&self, cancel: &CancellationToken) -> RepositoryResult<()> {
        self.hit();
        self.inner.ping(cancel).await
    }

    fn close(&self) {
        self.inner.close()
    }
}

/// Repository whose calls block until their token is cancelled.
#[derive(Default)]
pub struct StallingRepository {
    tokens: Mutex<Vec<CancellationToken>>,
}

impl StallingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens of every call received so far.
    pub fn tokens(&self) -> Vec<CancellationToken> {
        self.tokens.lock().unwrap().clone()
    }

    async fn stall<T>(&self, operation: &'static str, cancel: &CancellationToken) -> RepositoryResult<T> {
        self.tokens.lock().unwrap().push(cancel.clone());
        cancel.cancelled().await;
        Err(RepositoryError::cancelled(operation))
    }
}

#[async_trait]
impl QuoteRepository for StallingRepository {
    async fn save_quote(
        &self,
        _text: &str,
        _author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<QuoteId> {
        self.stall("save_quote", cancel).await
    }

    async fn delete_quote(&self, _id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<()> {
        self.stall("delete_quote", cancel).await
    }

    async fn get_quote(&self, _id: QuoteId, cancel: &CancellationToken) -> RepositoryResult<Quote> {
        self.stall("get_quote", cancel).await
    }

    async fn list_quotes(&self, cancel: &CancellationToken) -> RepositoryResult<Vec<StoredQuote>> {
        self.stall("list_quotes", cancel).await
    }

    async fn list_quotes_by_author(
        &self,
        _author: &str,
        cancel: &CancellationToken,
    ) -> RepositoryResult<Vec<StoredQuote>> {
        self.stall("list_quotes_by_author", cancel).await
    }

    async fn random_quote(&self, cancel: &CancellationToken) -> RepositoryResult<Quote> {
        self.stall("random_quote", cancel).await
    }

    async fn ping(&self, cancel: &CancellationToken) -> RepositoryResult<()> {
        self.stall("ping", cancel).await
    }

    fn close(&self) {}
}
