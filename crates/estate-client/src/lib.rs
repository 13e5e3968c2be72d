//! Estate desk client
//!
//! Ties the REST backend, the shared query cache and the derived-state
//! engine together behind typed services the views call:
//! - [`Repository`] for properties, leads, bookings, reports and team members
//! - [`TrackerService`] for legal trackers and their steps
//! - [`NotificationFeed`] for one user's notifications

pub mod config;
pub mod http;
pub mod notifications;
pub mod path;
pub mod repository;
pub mod response;
pub mod rest;
pub mod trackers;

pub use config::ClientConfig;
pub use http::HttpRestClient;
pub use notifications::NotificationFeed;
pub use path::ResourcePath;
pub use repository::Repository;
pub use response::{DeleteResponse, ListResponse};
pub use rest::RestClient;
pub use trackers::TrackerService;

use std::sync::Arc;

use estate_engine::EstateEngine;
use estate_types::{Booking, Lead, Property, Report, Resource, Result, TeamMember};
use query_cache::{QueryCache, ViewScope};
use tracing::info;

/// One per app instance; cheap to clone
#[derive(Clone)]
pub struct EstateClient {
    rest: Arc<dyn RestClient>,
    cache: QueryCache,
    engine: EstateEngine,
    config: ClientConfig,
}

impl EstateClient {
    /// Client talking HTTP to `config.base_url`
    pub fn new(config: ClientConfig) -> Result<Self> {
        let rest = HttpRestClient::from_config(&config)?;
        Ok(Self::with_rest(config, Arc::new(rest)))
    }

    pub fn with_rest(config: ClientConfig, rest: Arc<dyn RestClient>) -> Self {
        info!(base_url = %config.base_url, "estate client ready");
        Self {
            cache: QueryCache::new(config.cache.clone()),
            engine: EstateEngine::new(config.risk.clone()),
            rest,
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn engine(&self) -> &EstateEngine {
        &self.engine
    }

    pub fn repository<R: Resource>(&self) -> Repository<R> {
        Repository::new(Arc::clone(&self.rest), self.cache.clone())
    }

    pub fn properties(&self) -> Repository<Property> {
        self.repository()
    }

    pub fn leads(&self) -> Repository<Lead> {
        self.repository()
    }

    pub fn bookings(&self) -> Repository<Booking> {
        self.repository()
    }

    pub fn reports(&self) -> Repository<Report> {
        self.repository()
    }

    pub fn team_members(&self) -> Repository<TeamMember> {
        self.repository()
    }

    pub fn trackers(&self) -> TrackerService {
        TrackerService::new(self.repository(), self.engine.clone())
    }

    pub fn notifications(&self, user_id: &str) -> NotificationFeed {
        NotificationFeed::new(
            self.repository(),
            user_id,
            self.config.notification_poll_interval,
        )
    }

    /// Scope for one view's background work; drop it when the view closes
    pub fn view_scope(&self, name: &str) -> ViewScope {
        ViewScope::new(name, self.cache.clone())
    }

    /// Drops every cached entry
    pub async fn shutdown(&self) {
        self.cache.clear().await;
    }
}
