//! Client configuration
//!
//! Loaded from a TOML file or from environment variables:
//!
//! ```toml
//! base_url = "https://estate.example.com"
//! request_timeout_ms = 10000
//! notification_poll_interval_ms = 30000
//!
//! [cache]
//! stale_time_ms = 30000
//! retry = 1
//!
//! [[risk.bands]]
//! max_score = 3.0
//! level = "low"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use estate_engine::RiskThresholds;
use query_cache::config::duration_ms;
use query_cache::CacheConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the REST backend; paths are appended as `/api/...`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(
        rename = "request_timeout_ms",
        with = "duration_ms",
        default = "default_request_timeout"
    )]
    pub request_timeout: Duration,

    /// How often notification views refetch
    #[serde(
        rename = "notification_poll_interval_ms",
        with = "duration_ms",
        default = "default_notification_poll"
    )]
    pub notification_poll_interval: Duration,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub risk: RiskThresholds,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_notification_poll() -> Duration {
    Duration::from_secs(30)
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            notification_poll_interval: default_notification_poll(),
            cache: CacheConfig::default(),
            risk: RiskThresholds::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables, falling back to defaults
    ///
    /// Expected variables:
    /// - ESTATE_API_BASE_URL
    /// - ESTATE_REQUEST_TIMEOUT_MS
    /// - ESTATE_NOTIFICATION_POLL_MS
    /// - the ESTATE_CACHE_* variables read by [`CacheConfig::from_env`]
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            base_url: std::env::var("ESTATE_API_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout: env_millis("ESTATE_REQUEST_TIMEOUT_MS")?
                .unwrap_or(defaults.request_timeout),
            notification_poll_interval: env_millis("ESTATE_NOTIFICATION_POLL_MS")?
                .unwrap_or(defaults.notification_poll_interval),
            cache: CacheConfig::from_env()?,
            risk: defaults.risk,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            bail!("base_url must not be empty");
        }
        if self.request_timeout.is_zero() {
            bail!("request_timeout_ms must be positive");
        }
        if self.notification_poll_interval.is_zero() {
            bail!("notification_poll_interval_ms must be positive");
        }
        self.risk.validate().context("Invalid risk thresholds")?;
        Ok(())
    }
}

fn env_millis(name: &str) -> Result<Option<Duration>> {
    match std::env::var(name) {
        Ok(v) => {
            let ms: u64 = v
                .trim()
                .parse()
                .with_context(|| format!("{} is not a millisecond count: {:?}", name, v))?;
            Ok(Some(Duration::from_millis(ms)))
        }
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_types::RiskLevel;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ClientConfig::from_str("").unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.notification_poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_full_file() {
        let config = ClientConfig::from_str(
            r#"
            base_url = "https://estate.example.com"
            request_timeout_ms = 5000
            notification_poll_interval_ms = 15000

            [cache]
            stale_time_ms = 60000
            retry = 2

            [risk]
            fallback = "critical"

            [[risk.bands]]
            max_score = 2.0
            level = "low"

            [[risk.bands]]
            max_score = 7.0
            level = "high"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "https://estate.example.com");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.cache.stale_time, Duration::from_secs(60));
        assert_eq!(config.cache.retry, 2);
        assert_eq!(config.risk.classify(5.0), RiskLevel::High);
        assert_eq!(config.risk.classify(9.0), RiskLevel::Critical);
    }

    #[test]
    fn test_descending_risk_bands_rejected() {
        let err = ClientConfig::from_str(
            r#"
            [[risk.bands]]
            max_score = 6.0
            level = "medium"

            [[risk.bands]]
            max_score = 3.0
            level = "low"
            "#,
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("risk thresholds"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(ClientConfig::from_str("notification_poll_interval_ms = 0").is_err());
    }

    #[test]
    fn test_missing_file_has_context() {
        let err = ClientConfig::from_file("/nonexistent/estate.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
