use std::sync::Arc;

use chrono::{DateTime, Utc};
use estate_types::{EstateError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// What a view sees for one cache key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryState {
    /// Last successfully fetched data, kept while refetching or after errors
    pub data: Option<Arc<Value>>,
    /// Error of the most recent fetch, cleared by the next success
    pub error: Option<EstateError>,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueryState {
    /// First load: nothing to show yet and a fetch is running
    pub fn is_loading(&self) -> bool {
        self.data.is_none() && self.is_fetching
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match &self.data {
            Some(value) => Ok(Some(T::deserialize(value.as_ref()).map_err(EstateError::from)?)),
            None => Ok(None),
        }
    }
}
