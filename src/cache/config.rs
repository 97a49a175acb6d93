//! Configuration for the article cache

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Durable key holding the recently-viewed ledger
pub const DEFAULT_RECENT_KEY: &str = "recently_viewed_articles";

/// Prefix of the per-article durable keys (`<prefix>:<uri>`)
pub const DEFAULT_DETAIL_KEY_PREFIX: &str = "article_detail_cache";

/// Configuration for the article detail cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of article details held in memory
    pub capacity: usize,

    /// Age after which a stored detail is treated as absent
    pub ttl: Duration,

    /// Maximum length of the recently-viewed ledger
    pub recent_capacity: usize,

    /// Number of recent latency/payload samples kept for windowed averages
    pub sample_window: usize,

    /// Mirror each written detail under its own durable key
    pub persist_details: bool,

    /// Durable key for the ledger blob
    pub recent_key: String,

    /// Prefix for per-article durable keys
    pub detail_key_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 10,
            // 10 minutes
            ttl: Duration::from_secs(600),
            recent_capacity: 10,
            sample_window: 256,
            persist_details: true,
            recent_key: DEFAULT_RECENT_KEY.to_string(),
            detail_key_prefix: DEFAULT_DETAIL_KEY_PREFIX.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::Config(
                "capacity must be greater than 0".to_string(),
            ));
        }

        if self.ttl.is_zero() {
            return Err(CacheError::Config("ttl must be greater than 0".to_string()));
        }

        if self.recent_capacity == 0 {
            return Err(CacheError::Config(
                "recent_capacity must be greater than 0".to_string(),
            ));
        }

        if self.sample_window == 0 {
            return Err(CacheError::Config(
                "sample_window must be greater than 0".to_string(),
            ));
        }

        if self.recent_key.is_empty() || self.detail_key_prefix.is_empty() {
            return Err(CacheError::Config(
                "storage keys must not be empty".to_string(),
            ));
        }

        if self.recent_key.starts_with(&format!("{}:", self.detail_key_prefix)) {
            return Err(CacheError::Config(
                "recent_key must not live under detail_key_prefix".to_string(),
            ));
        }

        Ok(())
    }

    /// Durable key for a single article
    pub fn detail_key(&self, uri: &str) -> String {
        format!("{}:{}", self.detail_key_prefix, uri)
    }

    /// Load configuration from the environment (and a `.env` file if present)
    ///
    /// Recognised variables: `ARTICLE_CACHE_CAPACITY`, `ARTICLE_CACHE_TTL_SECS`,
    /// `ARTICLE_CACHE_RECENT_CAPACITY`, `ARTICLE_CACHE_SAMPLE_WINDOW`,
    /// `ARTICLE_CACHE_PERSIST_DETAILS`. Unparsable values keep the default.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = CacheConfig::builder();

        if let Some(capacity) = parse_var::<usize, _>(&lookup, "ARTICLE_CACHE_CAPACITY") {
            builder = builder.capacity(capacity);
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "ARTICLE_CACHE_TTL_SECS") {
            builder = builder.ttl(Duration::from_secs(secs));
        }
        if let Some(recent) = parse_var::<usize, _>(&lookup, "ARTICLE_CACHE_RECENT_CAPACITY") {
            builder = builder.recent_capacity(recent);
        }
        if let Some(window) = parse_var::<usize, _>(&lookup, "ARTICLE_CACHE_SAMPLE_WINDOW") {
            builder = builder.sample_window(window);
        }
        if let Some(persist) = parse_var::<bool, _>(&lookup, "ARTICLE_CACHE_PERSIST_DETAILS") {
            builder = builder.persist_details(persist);
        }

        builder.build()
    }
}

fn parse_var<T, F>(lookup: &F, name: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparsable {}={:?}, using default", name, raw);
            None
        }
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    capacity: Option<usize>,
    ttl: Option<Duration>,
    recent_capacity: Option<usize>,
    sample_window: Option<usize>,
    persist_details: Option<bool>,
    recent_key: Option<String>,
    detail_key_prefix: Option<String>,
}

impl CacheConfigBuilder {
    /// Set the in-memory entry limit
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the entry ttl
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Set the recently-viewed ledger length
    pub fn recent_capacity(mut self, capacity: usize) -> Self {
        self.recent_capacity = Some(capacity);
        self
    }

    /// Set the metrics sample window
    pub fn sample_window(mut self, window: usize) -> Self {
        self.sample_window = Some(window);
        self
    }

    /// Enable or disable per-article durable mirroring
    pub fn persist_details(mut self, enable: bool) -> Self {
        self.persist_details = Some(enable);
        self
    }

    /// Override the durable key for the ledger
    pub fn recent_key(mut self, key: impl Into<String>) -> Self {
        self.recent_key = Some(key.into());
        self
    }

    /// Override the per-article key prefix
    pub fn detail_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.detail_key_prefix = Some(prefix.into());
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            capacity: self.capacity.unwrap_or(defaults.capacity),
            ttl: self.ttl.unwrap_or(defaults.ttl),
            recent_capacity: self.recent_capacity.unwrap_or(defaults.recent_capacity),
            sample_window: self.sample_window.unwrap_or(defaults.sample_window),
            persist_details: self.persist_details.unwrap_or(defaults.persist_details),
            recent_key: self.recent_key.unwrap_or(defaults.recent_key),
            detail_key_prefix: self.detail_key_prefix.unwrap_or(defaults.detail_key_prefix),
        }
    }
}

/// Preset configurations
impl CacheConfig {
    /// Tight limits for low-memory devices
    pub fn small() -> Self {
        Self {
            capacity: 5,
            ttl: Duration::from_secs(300), // 5 minutes
            recent_capacity: 5,
            sample_window: 64,
            ..Default::default()
        }
    }

    /// Longer-lived entries for offline reading sessions
    pub fn offline_reading() -> Self {
        Self {
            capacity: 50,
            ttl: Duration::from_secs(6 * 3600), // 6 hours
            recent_capacity: 20,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 10);
        assert_eq!(config.ttl, Duration::from_secs(600));
        assert_eq!(config.recent_capacity, 10);
        assert_eq!(config.recent_key, "recently_viewed_articles");
        assert!(config.persist_details);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid = CacheConfig::default();
        invalid.capacity = 0;
        assert!(matches!(invalid.validate(), Err(CacheError::Config(_))));

        let mut invalid = CacheConfig::default();
        invalid.ttl = Duration::ZERO;
        assert!(invalid.validate().is_err());

        let mut invalid = CacheConfig::default();
        invalid.recent_capacity = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = CacheConfig::default();
        invalid.sample_window = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = CacheConfig::default();
        invalid.recent_key = String::new();
        assert!(invalid.validate().is_err());

        let invalid = CacheConfig::builder()
            .recent_key("article_detail_cache:recent")
            .build();
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .capacity(3)
            .ttl(Duration::from_secs(60))
            .recent_capacity(4)
            .persist_details(false)
            .build();

        assert_eq!(config.capacity, 3);
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.recent_capacity, 4);
        assert!(!config.persist_details);
        assert_eq!(config.sample_window, 256);
    }

    #[test]
    fn test_detail_key() {
        let config = CacheConfig::default();
        assert_eq!(
            config.detail_key("eng-8123"),
            "article_detail_cache:eng-8123"
        );
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("ARTICLE_CACHE_CAPACITY", "25"),
            ("ARTICLE_CACHE_TTL_SECS", "120"),
            ("ARTICLE_CACHE_RECENT_CAPACITY", "not-a-number"),
            ("ARTICLE_CACHE_PERSIST_DETAILS", "false"),
        ]
        .into_iter()
        .collect();

        let config = CacheConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.capacity, 25);
        assert_eq!(config.ttl, Duration::from_secs(120));
        assert_eq!(config.recent_capacity, 10);
        assert!(!config.persist_details);
    }

    #[test]
    fn test_preset_configs() {
        let small = CacheConfig::small();
        assert_eq!(small.capacity, 5);
        assert!(small.validate().is_ok());

        let offline = CacheConfig::offline_reading();
        assert_eq!(offline.ttl, Duration::from_secs(6 * 3600));
        assert!(offline.validate().is_ok());
    }
}
