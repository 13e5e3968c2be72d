//! Cache tuning knobs
//!
//! Durations are written in milliseconds in config files and environment
//! variables (`stale_time_ms = 30000`).

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long fetched data counts as fresh
    #[serde(rename = "stale_time_ms", with = "duration_ms")]
    pub stale_time: Duration,

    /// Silent retries of a network failure before it is surfaced
    pub retry: u32,

    #[serde(rename = "retry_delay_ms", with = "duration_ms")]
    pub retry_delay: Duration,

    /// Default polling period for views that opt into polling
    #[serde(rename = "refetch_interval_ms", with = "option_duration_ms")]
    pub refetch_interval: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_time: Duration::from_secs(30),
            retry: 1,
            retry_delay: Duration::from_millis(250),
            refetch_interval: None,
        }
    }
}

impl CacheConfig {
    /// Load from environment variables, falling back to defaults
    ///
    /// Expected variables:
    /// - ESTATE_CACHE_STALE_MS
    /// - ESTATE_CACHE_RETRY
    /// - ESTATE_CACHE_RETRY_DELAY_MS
    /// - ESTATE_CACHE_REFETCH_MS (0 disables polling)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            stale_time: env_millis("ESTATE_CACHE_STALE_MS")?.unwrap_or(defaults.stale_time),
            retry: match std::env::var("ESTATE_CACHE_RETRY") {
                Ok(v) => v
                    .trim()
                    .parse()
                    .with_context(|| format!("ESTATE_CACHE_RETRY is not a count: {:?}", v))?,
                Err(_) => defaults.retry,
            },
            retry_delay: env_millis("ESTATE_CACHE_RETRY_DELAY_MS")?.unwrap_or(defaults.retry_delay),
            refetch_interval: env_millis("ESTATE_CACHE_REFETCH_MS")?
                .filter(|d| !d.is_zero())
                .or(defaults.refetch_interval),
        })
    }

    pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
        self.stale_time = stale_time;
        self
    }

    pub fn with_retry(mut self, retry: u32, delay: Duration) -> Self {
        self.retry = retry;
        self.retry_delay = delay;
        self
    }

    pub fn with_refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
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

/// Serde adapter for `Duration` as whole milliseconds
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Serde adapter for `Option<Duration>` as milliseconds, 0 or absent meaning `None`
pub mod option_duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.map_or(0, |d| d.as_millis() as u64))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        let ms = Option::<u64>::deserialize(deserializer)?;
        Ok(ms.filter(|ms| *ms > 0).map(Duration::from_millis))
    }
}
