//! The collection query cache service.
//!
//! One `QueryCache` is created per app instance and handed to every
//! repository; clones share the same entries. Each key holds the last good
//! data, the last error and at most one in-flight fetch. The fetch itself
//! runs in its own task and writes its result back into the entry, so a
//! waiter that goes away (a closed view) never leaves the key stuck.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use estate_types::{EstateError, Outcome, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::CacheConfig;
use crate::key::CacheKey;
use crate::poll::PollHandle;
use crate::state::QueryState;

/// Boxed remote read; called again for every retry
pub type Fetcher = Arc<dyn Fn() -> BoxFuture<'static, Result<Value>> + Send + Sync>;

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Value>>>>;

/// Wraps a closure returning a future into a [`Fetcher`]
pub fn fetcher<F, Fut>(f: F) -> Fetcher
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value>> + Send + 'static,
{
    Arc::new(move || f().boxed())
}

#[derive(Default)]
struct Entry {
    data: Option<Arc<Value>>,
    error: Option<EstateError>,
    fetched_at: Option<Instant>,
    updated_at: Option<DateTime<Utc>>,
    invalidated: bool,
    /// Generation of the fetch allowed to settle this entry
    generation: u64,
    inflight: Option<SharedFetch>,
}

impl Entry {
    fn is_stale(&self, stale_time: Duration) -> bool {
        self.invalidated || self.fetched_at.map_or(true, |at| at.elapsed() >= stale_time)
    }

    fn state(&self, stale_time: Duration) -> QueryState {
        QueryState {
            data: self.data.clone(),
            error: self.error.clone(),
            is_fetching: self.inflight.is_some(),
            is_stale: self.is_stale(stale_time),
            updated_at: self.updated_at,
        }
    }

    fn store(&mut self, data: Arc<Value>) {
        self.data = Some(data);
        self.error = None;
        self.fetched_at = Some(Instant::now());
        self.updated_at = Some(Utc::now());
        self.invalidated = false;
    }
}

struct Inner {
    config: CacheConfig,
    entries: Mutex<HashMap<CacheKey, Entry>>,
    generations: AtomicU64,
}

impl Inner {
    fn next_generation(&self) -> u64 {
        self.generations.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Detach whatever is in flight so its late result is discarded
    fn detach(&self, entry: &mut Entry) {
        entry.generation = self.next_generation();
        entry.inflight = None;
    }

    async fn settle(&self, key: &CacheKey, generation: u64, result: &Result<Arc<Value>>) {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.get_mut(key) else {
            debug!(key = %key, "entry removed while fetching; result dropped");
            return;
        };
        if entry.generation != generation {
            debug!(key = %key, "superseded fetch result dropped");
            return;
        }
        entry.inflight = None;
        match result {
            Ok(data) => entry.store(Arc::clone(data)),
            Err(err) => entry.error = Some(err.clone()),
        }
    }
}

/// Snapshot of an entry taken before an optimistic write
pub struct OptimisticUpdate {
    key: CacheKey,
    previous: Option<Arc<Value>>,
    previous_fetched_at: Option<Instant>,
    previous_updated_at: Option<DateTime<Utc>>,
    applied: Option<Arc<Value>>,
}

impl OptimisticUpdate {
    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    /// Whether there was cached data to update
    pub fn was_applied(&self) -> bool {
        self.applied.is_some()
    }
}

#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                entries: Mutex::new(HashMap::new()),
                generations: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Data for `key`, fetching only when needed.
    ///
    /// - fresh data is returned from the cache;
    /// - data older than `stale_time` is returned immediately while one
    ///   background refetch runs;
    /// - missing or invalidated data is fetched and awaited, joining a
    ///   fetch already in flight for the same key.
    pub async fn fetch<F, Fut>(&self, key: &CacheKey, f: F) -> Result<Arc<Value>>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.fetch_with(key, fetcher(f)).await
    }

    pub async fn fetch_with(&self, key: &CacheKey, fetcher: Fetcher) -> Result<Arc<Value>> {
        let stale_time = self.inner.config.stale_time;
        let pending = {
            let mut entries = self.inner.entries.lock().await;
            let entry = entries.entry(key.clone()).or_default();

            match &entry.data {
                Some(data) if !entry.is_stale(stale_time) => {
                    debug!(key = %key, "cache hit");
                    return Ok(Arc::clone(data));
                }
                Some(data) if !entry.invalidated => {
                    let data = Arc::clone(data);
                    if entry.inflight.is_none() {
                        debug!(key = %key, "serving stale data, revalidating in background");
                        let _ = self.start_fetch(key, entry, fetcher);
                    }
                    return Ok(data);
                }
                _ => match &entry.inflight {
                    Some(inflight) => {
                        debug!(key = %key, "joining in-flight fetch");
                        inflight.clone()
                    }
                    None => {
                        debug!(key = %key, "cache miss");
                        self.start_fetch(key, entry, fetcher)
                    }
                },
            }
        };
        pending.await
    }

    /// Typed variant of [`QueryCache::fetch`]
    pub async fn fetch_as<T, F, Fut>(&self, key: &CacheKey, f: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let value = self.fetch(key, f).await?;
        Ok(T::deserialize(value.as_ref())?)
    }

    /// Typed fetch folded into the `{ok, data, error}` envelope views render
    pub async fn query_as<T, F, Fut>(&self, key: &CacheKey, f: F) -> Outcome<T>
    where
        T: DeserializeOwned,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.fetch_as(key, f).await.into()
    }

    /// `{data, is_loading, is_error}` view of a key after fetching it
    pub async fn query<F, Fut>(&self, key: &CacheKey, f: F) -> QueryState
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let result = self.fetch(key, f).await;
        let mut state = self.snapshot(key).await;
        match result {
            Ok(data) => state.data = Some(data),
            Err(err) => state.error = Some(err),
        }
        state
    }

    /// Forces a fetch regardless of freshness, joining one already in flight
    pub async fn refetch_with(&self, key: &CacheKey, fetcher: Fetcher) -> Result<Arc<Value>> {
        let pending = {
            let mut entries = self.inner.entries.lock().await;
            let entry = entries.entry(key.clone()).or_default();
            match &entry.inflight {
                Some(inflight) => inflight.clone(),
                None => self.start_fetch(key, entry, fetcher),
            }
        };
        pending.await
    }

    /// Current state of a key without triggering a fetch
    pub async fn snapshot(&self, key: &CacheKey) -> QueryState {
        let entries = self.inner.entries.lock().await;
        entries
            .get(key)
            .map(|entry| entry.state(self.inner.config.stale_time))
            .unwrap_or_else(|| QueryState {
                is_stale: true,
                ..QueryState::default()
            })
    }

    /// Marks `key` stale so the next access refetches and waits for the
    /// result. A fetch already in flight is detached and its result ignored.
    pub async fn invalidate(&self, key: &CacheKey) {
        let mut entries = self.inner.entries.lock().await;
        if let Some(entry) = entries.get_mut(key) {
            entry.invalidated = true;
            self.inner.detach(entry);
            info!(key = %key, "cache key invalidated");
        }
    }

    /// Invalidates every key starting with `prefix`; returns how many
    pub async fn invalidate_prefix(&self, prefix: &CacheKey) -> usize {
        let mut entries = self.inner.entries.lock().await;
        let mut count = 0;
        for (key, entry) in entries.iter_mut() {
            if key.starts_with(prefix) {
                entry.invalidated = true;
                self.inner.detach(entry);
                count += 1;
            }
        }
        info!(prefix = %prefix, count, "cache prefix invalidated");
        count
    }

    /// Seeds or replaces the data under `key` as freshly fetched
    pub async fn set_data(&self, key: &CacheKey, data: Value) {
        let mut entries = self.inner.entries.lock().await;
        let entry = entries.entry(key.clone()).or_default();
        self.inner.detach(entry);
        entry.store(Arc::new(data));
    }

    pub async fn remove(&self, key: &CacheKey) {
        self.inner.entries.lock().await.remove(key);
    }

    /// Drops every entry; in-flight fetches finish into nothing
    pub async fn clear(&self) {
        let mut entries = self.inner.entries.lock().await;
        let count = entries.len();
        entries.clear();
        info!(count, "query cache cleared");
    }

    /// Runs a create/update/delete. Nothing is invalidated here: callers
    /// name the keys they affect, see [`QueryCache::mutate_and_invalidate`].
    pub async fn mutate<F, Fut>(&self, mutation: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        mutation().await.map_err(|err| {
            let err = into_mutation_error(err);
            error!(error = %err, "mutation failed");
            err
        })
    }

    /// Runs a mutation and invalidates `keys` only once it succeeded
    pub async fn mutate_and_invalidate<F, Fut>(&self, mutation: F, keys: &[CacheKey]) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let value = self.mutate(mutation).await?;
        for key in keys {
            self.invalidate(key).await;
        }
        Ok(value)
    }

    /// Applies `update` to the cached data under `key` and returns what is
    /// needed to undo it. Keys without data are left alone.
    pub async fn begin_optimistic<U>(&self, key: &CacheKey, update: U) -> OptimisticUpdate
    where
        U: FnOnce(&Value) -> Value,
    {
        let mut entries = self.inner.entries.lock().await;
        let mut snapshot = OptimisticUpdate {
            key: key.clone(),
            previous: None,
            previous_fetched_at: None,
            previous_updated_at: None,
            applied: None,
        };
        if let Some(entry) = entries.get_mut(key) {
            if let Some(current) = entry.data.clone() {
                let next = Arc::new(update(current.as_ref()));
                snapshot.previous = Some(current);
                snapshot.previous_fetched_at = entry.fetched_at;
                snapshot.previous_updated_at = entry.updated_at;
                snapshot.applied = Some(Arc::clone(&next));
                entry.data = Some(next);
                entry.updated_at = Some(Utc::now());
            }
        }
        snapshot
    }

    /// Restores the pre-update data, unless something newer already replaced
    /// the optimistic value
    pub async fn rollback(&self, update: OptimisticUpdate) {
        let Some(applied) = update.applied else {
            return;
        };
        let mut entries = self.inner.entries.lock().await;
        if let Some(entry) = entries.get_mut(&update.key) {
            let untouched = entry.data.as_ref().is_some_and(|d| Arc::ptr_eq(d, &applied));
            if untouched {
                entry.data = update.previous;
                entry.fetched_at = update.previous_fetched_at;
                entry.updated_at = update.previous_updated_at;
                warn!(key = %update.key, "optimistic update rolled back");
            }
        }
    }

    /// Optimistic update around a mutation: on failure the cached data is
    /// rolled back and nothing is invalidated; on success `invalidate` keys
    /// are marked stale.
    pub async fn mutate_optimistic<U, F, Fut>(
        &self,
        key: &CacheKey,
        update: U,
        mutation: F,
        invalidate: &[CacheKey],
    ) -> Result<Value>
    where
        U: FnOnce(&Value) -> Value,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let snapshot = self.begin_optimistic(key, update).await;
        match self.mutate(mutation).await {
            Ok(value) => {
                for key in invalidate {
                    self.invalidate(key).await;
                }
                Ok(value)
            }
            Err(err) => {
                self.rollback(snapshot).await;
                Err(err)
            }
        }
    }

    /// Refetches `key` every `every` until the handle is dropped. The first
    /// fetch happens immediately.
    pub fn poll<F, Fut>(&self, key: CacheKey, f: F, every: Duration) -> Result<PollHandle>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        self.poll_with(key, fetcher(f), every)
    }

    /// Polls `key` at the configured `refetch_interval`. Caches without one
    /// have polling turned off and reject the call.
    pub fn poll_default<F, Fut>(&self, key: CacheKey, f: F) -> Result<PollHandle>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let every = self.inner.config.refetch_interval.ok_or_else(|| {
            EstateError::Config(format!("no refetch interval configured to poll {}", key))
        })?;
        self.poll_with(key, fetcher(f), every)
    }

    pub fn poll_with(&self, key: CacheKey, fetcher: Fetcher, every: Duration) -> Result<PollHandle> {
        if every.is_zero() {
            return Err(EstateError::Validation(format!(
                "polling interval for {} must be positive",
                key
            )));
        }
        let cache = self.clone();
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = cache.refetch_with(&task_key, Arc::clone(&fetcher)).await {
                    debug!(key = %task_key, error = %err, "poll fetch failed");
                }
            }
        });
        info!(key = %key, every_ms = every.as_millis() as u64, "polling started");
        Ok(PollHandle::new(key, task))
    }

    /// Caller must hold the entries lock (it owns `entry`)
    fn start_fetch(&self, key: &CacheKey, entry: &mut Entry, fetcher: Fetcher) -> SharedFetch {
        let generation = self.inner.next_generation();
        entry.generation = generation;

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let result = run_with_retry(&fetcher, &inner.config, &task_key)
                .await
                .map(Arc::new);
            inner.settle(&task_key, generation, &result).await;
            result
        });

        let shared = async move {
            task.await.unwrap_or_else(|err| {
                Err(EstateError::Network(format!("fetch task did not complete: {}", err)))
            })
        }
        .boxed()
        .shared();
        entry.inflight = Some(shared.clone());
        shared
    }
}

async fn run_with_retry(fetcher: &Fetcher, config: &CacheConfig, key: &CacheKey) -> Result<Value> {
    let mut attempt = 0;
    loop {
        match fetcher().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < config.retry => {
                attempt += 1;
                warn!(key = %key, attempt, error = %err, "fetch failed, retrying");
                if !config.retry_delay.is_zero() {
                    tokio::time::sleep(config.retry_delay).await;
                }
            }
            Err(err) => {
                warn!(key = %key, error = %err, "fetch failed");
                return Err(err);
            }
        }
    }
}

/// Mutation failures keep their kind when it tells the caller something
/// actionable; anything else is reported as a rejected mutation
fn into_mutation_error(err: EstateError) -> EstateError {
    match err {
        EstateError::Network(_)
        | EstateError::Validation(_)
        | EstateError::NotFound(_)
        | EstateError::Mutation(_) => err,
        EstateError::Decode(msg) | EstateError::Config(msg) => EstateError::Mutation(msg),
    }
}
