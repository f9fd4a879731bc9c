//! Configuration for the memoization cache

use crate::error::{IntelError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`crate::cache::MemoCache`]
///
/// The cache is sized for a client-side working set: a few hundred lessons'
/// worth of summaries and question sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Default time-to-live for cache entries
    pub default_ttl: Duration,

    /// Maximum number of live entries; the least recently used one is evicted
    /// before an insert would exceed it
    pub max_entries: usize,

    /// TTL jitter factor (0.0 - 1.0)
    /// Spreads expiry of entries computed together
    pub ttl_jitter: f64,

    /// Enable the background sweep of expired entries
    /// (expiry is otherwise checked lazily on access)
    pub enable_auto_cleanup: bool,

    /// Interval for the background sweep
    pub cleanup_interval: Duration,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(3600),
            max_entries: 500,
            ttl_jitter: 0.0,
            enable_auto_cleanup: false,
            cleanup_interval: Duration::from_secs(300),
            enable_metrics: true,
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
        if self.max_entries == 0 {
            return Err(IntelError::ConfigError(
                "max_entries must be greater than 0".to_string(),
            ));
        }

        if self.default_ttl.is_zero() {
            return Err(IntelError::ConfigError(
                "default_ttl must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(IntelError::ConfigError(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.enable_auto_cleanup && self.cleanup_interval.is_zero() {
            return Err(IntelError::ConfigError(
                "cleanup_interval must be greater than 0 when auto cleanup is enabled"
                    .to_string(),
            ));
        }

        Ok(())
    }

    /// Apply the configured jitter to a TTL
    pub fn jittered(&self, ttl: Duration) -> Duration {
        if self.ttl_jitter == 0.0 {
            return ttl;
        }

        let base_ms = ttl.as_secs_f64() * 1000.0;
        let jitter_range = base_ms * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_ms = (base_ms + jitter).max(1.0);

        Duration::from_secs_f64(final_ms / 1000.0)
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    default_ttl: Option<Duration>,
    max_entries: Option<usize>,
    ttl_jitter: Option<f64>,
    enable_auto_cleanup: Option<bool>,
    cleanup_interval: Option<Duration>,
    enable_metrics: Option<bool>,
}

impl CacheConfigBuilder {
    /// Set default TTL for cache entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set maximum number of cache entries
    pub fn max_entries(mut self, max: usize) -> Self {
        self.max_entries = Some(max);
        self
    }

    /// Set TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Enable or disable the background sweep
    pub fn enable_auto_cleanup(mut self, enable: bool) -> Self {
        self.enable_auto_cleanup = Some(enable);
        self
    }

    /// Set cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Enable or disable metrics collection
    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = Some(enable);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            max_entries: self.max_entries.unwrap_or(defaults.max_entries),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            enable_auto_cleanup: self
                .enable_auto_cleanup
                .unwrap_or(defaults.enable_auto_cleanup),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
            enable_metrics: self.enable_metrics.unwrap_or(defaults.enable_metrics),
        }
    }
}

/// Preset configurations
impl CacheConfig {
    /// Small, short-lived cache for memory-constrained clients
    pub fn small() -> Self {
        Self {
            default_ttl: Duration::from_secs(600), // 10 minutes
            max_entries: 64,
            ..Default::default()
        }
    }

    /// Cache that lives for a whole study session
    pub fn session() -> Self {
        Self {
            default_ttl: Duration::from_secs(8 * 3600),
            max_entries: 2_000,
            ttl_jitter: 0.1,
            enable_auto_cleanup: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(3600));
        assert_eq!(config.max_entries, 500);
        assert!(!config.enable_auto_cleanup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut invalid_config = CacheConfig::default();
        invalid_config.max_entries = 0;
        assert!(matches!(
            invalid_config.validate(),
            Err(IntelError::ConfigError(_))
        ));

        let mut invalid_config = CacheConfig::default();
        invalid_config.ttl_jitter = 1.5;
        assert!(invalid_config.validate().is_err());

        let mut invalid_config = CacheConfig::default();
        invalid_config.default_ttl = Duration::ZERO;
        assert!(invalid_config.validate().is_err());

        let invalid_config = CacheConfig::builder()
            .enable_auto_cleanup(true)
            .cleanup_interval(Duration::ZERO)
            .build();
        assert!(invalid_config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .default_ttl(Duration::from_secs(600))
            .max_entries(5000)
            .ttl_jitter(0.2)
            .build();

        assert_eq!(config.default_ttl, Duration::from_secs(600));
        assert_eq!(config.max_entries, 5000);
        assert_eq!(config.ttl_jitter, 0.2);
        assert!(config.enable_metrics);
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let config = CacheConfig {
            ttl_jitter: 0.1,
            ..Default::default()
        };

        let ttl = config.jittered(Duration::from_secs(3600));
        let base_secs = 3600.0;
        let jitter_range = base_secs * 0.1;

        assert!(ttl.as_secs_f64() >= base_secs - jitter_range);
        assert!(ttl.as_secs_f64() <= base_secs + jitter_range);
    }

    #[test]
    fn test_no_jitter_is_exact() {
        let config = CacheConfig::default();
        assert_eq!(
            config.jittered(Duration::from_millis(250)),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_preset_configs() {
        assert_eq!(CacheConfig::small().max_entries, 64);
        assert!(CacheConfig::session().enable_auto_cleanup);
        assert!(CacheConfig::session().validate().is_ok());
    }
}
