//! REST resource paths and their cache keys

use std::fmt;

use estate_engine::ALL;
use estate_types::Resource;
use query_cache::CacheKey;

pub const API_PREFIX: &str = "/api";

/// Marks record keys so they never collide with per-owner list keys such as
/// `["/api/notifications", <userId>]`
pub const RECORD_KEY_SEGMENT: &str = "id";

/// `/api/<resource>[/<id>][/<sub>[/<subId>]]` plus query params
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    resource: String,
    segments: Vec<String>,
    query: Vec<(String, String)>,
}

impl ResourcePath {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            segments: Vec::new(),
            query: Vec::new(),
        }
    }

    pub fn collection<R: Resource>() -> Self {
        Self::new(R::PATH)
    }

    pub fn record<R: Resource>(id: &str) -> Self {
        Self::new(R::PATH).segment(id)
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Adds one query param; empty values and `"all"` mean no constraint
    /// and are dropped
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() && value != ALL {
            self.query.push((key.into(), value));
        }
        self
    }

    pub fn params<I, K, V>(self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        params.into_iter().fold(self, |path, (k, v)| path.param(k, v))
    }

    /// Collection root, e.g. `/api/leads`
    pub fn base(&self) -> String {
        format!("{}/{}", API_PREFIX, self.resource)
    }

    /// Path without the query string
    pub fn path(&self) -> String {
        let mut path = self.base();
        for segment in &self.segments {
            path.push('/');
            path.push_str(segment);
        }
        path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// Key this path is cached under. Every key of a resource starts with
    /// the collection root, so prefix invalidation covers records and
    /// filtered lists alike. Record paths are keyed as
    /// `[<root>, "id", <id>, ...]`.
    pub fn cache_key(&self) -> CacheKey {
        let mut key = CacheKey::root(self.base());
        if !self.segments.is_empty() {
            key = key.with(RECORD_KEY_SEGMENT);
        }
        for segment in &self.segments {
            key = key.with(segment.clone());
        }
        for (k, v) in &self.query {
            key = key.with(format!("{}={}", k, v));
        }
        key
    }

    pub fn base_key(&self) -> CacheKey {
        CacheKey::root(self.base())
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())?;
        for (i, (k, v)) in self.query.iter().enumerate() {
            write!(f, "{}{}={}", if i == 0 { '?' } else { '&' }, k, v)?;
        }
        Ok(())
    }
}
