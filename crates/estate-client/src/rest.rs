use async_trait::async_trait;
use estate_types::Result;
use serde_json::Value;

use crate::path::ResourcePath;

/// The REST backend as the views see it: JSON in, JSON out, failures
/// already mapped onto [`estate_types::EstateError`].
#[async_trait]
pub trait RestClient: Send + Sync {
    async fn get(&self, path: &ResourcePath) -> Result<Value>;

    async fn post(&self, path: &ResourcePath, body: Value) -> Result<Value>;

    async fn patch(&self, path: &ResourcePath, body: Value) -> Result<Value>;

    async fn put(&self, path: &ResourcePath, body: Value) -> Result<Value>;

    async fn delete(&self, path: &ResourcePath) -> Result<Value>;
}
