//! Lifetimes of background work: polls and view scopes.

use std::future::Future;
use std::time::Duration;

use estate_types::Result;
use serde_json::Value;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info};

use crate::cache::QueryCache;
use crate::key::CacheKey;

/// A running poll. Dropping it stops the poll.
#[derive(Debug)]
pub struct PollHandle {
    key: CacheKey,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub(crate) fn new(key: CacheKey, task: JoinHandle<()>) -> Self {
        Self { key, task }
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn cancel(self) {
        // Drop aborts
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        debug!(key = %self.key, "polling stopped");
    }
}

/// Owns the background work started on behalf of one view. When the view
/// goes away the scope is dropped and every poll and task it owns stops, so
/// nothing writes into a torn-down view.
pub struct ViewScope {
    name: String,
    cache: QueryCache,
    polls: Vec<PollHandle>,
    tasks: Vec<AbortHandle>,
}

impl ViewScope {
    pub fn new(name: impl Into<String>, cache: QueryCache) -> Self {
        Self {
            name: name.into(),
            cache,
            polls: Vec::new(),
            tasks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Starts polling `key` for as long as the scope lives
    pub fn poll<F, Fut>(&mut self, key: CacheKey, f: F, every: Duration) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let handle = self.cache.poll(key, f, every)?;
        self.polls.push(handle);
        Ok(())
    }

    /// Like [`ViewScope::poll`] at the cache's configured refetch interval
    pub fn watch<F, Fut>(&mut self, key: CacheKey, f: F) -> Result<()>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        let handle = self.cache.poll_default(key, f)?;
        self.polls.push(handle);
        Ok(())
    }

    /// Spawns a task that is aborted with the scope
    pub fn spawn<Fut>(&mut self, future: Fut) -> JoinHandle<Fut::Output>
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(handle.abort_handle());
        handle
    }

    pub fn active_polls(&self) -> usize {
        self.polls.iter().filter(|p| p.is_running()).count()
    }

    /// Spawned tasks that have not finished yet
    pub fn active_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
        info!(
            view = %self.name,
            polls = self.polls.len(),
            tasks = self.active_tasks(),
            "view scope closed"
        );
        // polls abort in their own Drop
    }
}
