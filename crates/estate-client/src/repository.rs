//! Typed access to one REST resource through the query cache

use std::marker::PhantomData;
use std::sync::Arc;

use estate_engine::{apply, FilterCriteria};
use estate_types::{validate_unique_ids, EstateError, Resource, Result};
use query_cache::{CacheKey, QueryCache};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::path::ResourcePath;
use crate::response::{DeleteResponse, ListResponse};
use crate::rest::RestClient;

/// Reads go through the cache; writes invalidate every key of the resource
/// once the backend accepted them.
pub struct Repository<R> {
    rest: Arc<dyn RestClient>,
    cache: QueryCache,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for Repository<R> {
    fn clone(&self) -> Self {
        Self {
            rest: Arc::clone(&self.rest),
            cache: self.cache.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> Repository<R> {
    pub fn new(rest: Arc<dyn RestClient>, cache: QueryCache) -> Self {
        Self {
            rest,
            cache,
            _resource: PhantomData,
        }
    }

    pub fn collection_key(&self) -> CacheKey {
        ResourcePath::collection::<R>().base_key()
    }

    pub fn record_key(&self, id: &str) -> CacheKey {
        ResourcePath::record::<R>(id).cache_key()
    }

    /// Records matching `criteria`, sorted if it asks for a sort.
    ///
    /// Criteria are validated before anything is sent. The server-side
    /// constraints become query params (and the cache key); the same criteria
    /// are then applied locally so the result never depends on how much
    /// filtering the backend did.
    pub async fn list(&self, criteria: &FilterCriteria) -> Result<Vec<R>> {
        criteria.validate::<R>()?;
        let path = ResourcePath::collection::<R>().params(criteria.to_query_params());
        let response: ListResponse<R> = self
            .cache
            .fetch_as(&path.cache_key(), self.reader(path.clone()))
            .await?;

        let items = response.into_items();
        validate_unique_ids(&items)?;
        let result = apply(&items, criteria);
        debug!(
            resource = R::PATH,
            fetched = items.len(),
            matched = result.len(),
            "list"
        );
        Ok(result)
    }

    pub async fn list_all(&self) -> Result<Vec<R>> {
        self.list(&FilterCriteria::default()).await
    }

    pub async fn get(&self, id: &str) -> Result<R> {
        if id.trim().is_empty() {
            return Err(EstateError::Validation(format!("{} id must not be empty", R::NAME)));
        }
        let path = ResourcePath::record::<R>(id);
        self.cache
            .fetch_as(&path.cache_key(), self.reader(path.clone()))
            .await
            .map_err(|err| match err {
                EstateError::NotFound(_) => EstateError::not_found(R::NAME, id),
                other => other,
            })
    }

    /// POST a new record; `body` is whatever the create form produced
    pub async fn create<B: Serialize>(&self, body: &B) -> Result<R> {
        let body = serde_json::to_value(body)?;
        let path = ResourcePath::collection::<R>();
        let value = self.cache.mutate(|| self.rest.post(&path, body)).await?;
        self.invalidate().await;
        Ok(serde_json::from_value(value)?)
    }

    /// PATCH selected fields
    pub async fn update(&self, id: &str, patch: Value) -> Result<R> {
        if !patch.is_object() {
            return Err(EstateError::Validation(format!(
                "{} patch must be a JSON object",
                R::NAME
            )));
        }
        let path = ResourcePath::record::<R>(id);
        let value = self.cache.mutate(|| self.rest.patch(&path, patch)).await?;
        self.invalidate().await;
        Ok(serde_json::from_value(value)?)
    }

    /// PUT the full record
    pub async fn replace(&self, id: &str, record: &R) -> Result<R> {
        if record.id() != id {
            return Err(EstateError::Validation(format!(
                "{} id {:?} does not match path id {:?}",
                R::NAME,
                record.id(),
                id
            )));
        }
        let body = serde_json::to_value(record)?;
        let path = ResourcePath::record::<R>(id);
        let value = self.cache.mutate(|| self.rest.put(&path, body)).await?;
        self.invalidate().await;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = ResourcePath::record::<R>(id);
        let what = format!("{} {}", R::NAME, id);
        self.cache
            .mutate(|| async {
                let value = self.rest.delete(&path).await?;
                DeleteResponse::check(value, &what)?;
                Ok(Value::Null)
            })
            .await?;
        self.invalidate().await;
        Ok(())
    }

    /// Marks the collection, every filtered list and every record stale
    pub async fn invalidate(&self) {
        let count = self.cache.invalidate_prefix(&self.collection_key()).await;
        info!(resource = R::PATH, keys = count, "resource invalidated");
    }

    pub(crate) fn rest(&self) -> &Arc<dyn RestClient> {
        &self.rest
    }

    pub(crate) fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Owned fetcher for `path`, callable again for retries and polls
    pub(crate) fn reader(
        &self,
        path: ResourcePath,
    ) -> impl Fn() -> futures::future::BoxFuture<'static, Result<Value>> + Send + Sync + 'static
    {
        let rest = Arc::clone(&self.rest);
        move || {
            let rest = Arc::clone(&rest);
            let path = path.clone();
            Box::pin(async move { rest.get(&path).await })
        }
    }
}
