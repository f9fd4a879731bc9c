//! Service configuration
//!
//! [`IntelConfig`] is passed explicitly into
//! [`ContentIntelligence`](crate::intel::ContentIntelligence); nothing reads the
//! process environment except [`IntelConfig::from_env`].

use crate::cache::CacheConfig;
use crate::error::{IntelError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_BASE_URL: &str = "GEMINI_BASE_URL";
pub const ENV_REMOTE_TIMEOUT_MS: &str = "LESSON_INTEL_REMOTE_TIMEOUT_MS";
pub const ENV_CACHE_TTL_SECS: &str = "LESSON_INTEL_CACHE_TTL_SECS";
pub const ENV_CACHE_CAPACITY: &str = "LESSON_INTEL_CACHE_CAPACITY";

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for the content intelligence service
#[derive(Clone, Serialize, Deserialize)]
pub struct IntelConfig {
    /// API key for the generative provider; `None` runs fallback-only
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    /// Upper bound for one remote call
    pub remote_timeout: Duration,
    /// Sentences kept by the local summary heuristic
    pub summary_sentences: usize,
    /// Hard cap on local summary length, in characters
    pub max_summary_chars: usize,
    /// Question count used by the lesson helpers
    pub question_count: usize,
    pub cache: CacheConfig,
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            remote_timeout: Duration::from_secs(10),
            summary_sentences: 3,
            max_summary_chars: 1000,
            question_count: 5,
            cache: CacheConfig::default(),
        }
    }
}

impl IntelConfig {
    /// Load from the process environment, honouring a local `.env` file
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    ///
    /// Blank values count as unset. Unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();
        config.api_key = get(ENV_API_KEY);
        if let Some(model) = get(ENV_MODEL) {
            config.model = model;
        }
        if let Some(base_url) = get(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(ms) = get(ENV_REMOTE_TIMEOUT_MS) {
            config.remote_timeout = Duration::from_millis(parse_var(ENV_REMOTE_TIMEOUT_MS, &ms)?);
        }
        if let Some(secs) = get(ENV_CACHE_TTL_SECS) {
            config.cache.default_ttl = Duration::from_secs(parse_var(ENV_CACHE_TTL_SECS, &secs)?);
        }
        if let Some(capacity) = get(ENV_CACHE_CAPACITY) {
            config.cache.max_entries = parse_var(ENV_CACHE_CAPACITY, &capacity)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.remote_timeout.is_zero() {
            return Err(IntelError::ConfigError(
                "remote_timeout must be greater than 0".to_string(),
            ));
        }
        if self.summary_sentences == 0 {
            return Err(IntelError::ConfigError(
                "summary_sentences must be greater than 0".to_string(),
            ));
        }
        if self.max_summary_chars == 0 {
            return Err(IntelError::ConfigError(
                "max_summary_chars must be greater than 0".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(IntelError::ConfigError("model must not be empty".to_string()));
        }
        self.cache.validate()
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| IntelError::ConfigError(format!("{} has an invalid value: {:?}", name, value)))
}

impl fmt::Debug for IntelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("remote_timeout", &self.remote_timeout)
            .field("summary_sentences", &self.summary_sentences)
            .field("max_summary_chars", &self.max_summary_chars)
            .field("question_count", &self.question_count)
            .field("cache", &self.cache)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = IntelConfig::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "gemini-1.5-flash");
        assert_eq!(config.remote_timeout, Duration::from_secs(10));
        assert_eq!(config.summary_sentences, 3);
        assert_eq!(config.max_summary_chars, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_overrides() {
        let config = IntelConfig::from_lookup(lookup(&[
            (ENV_API_KEY, "key-123"),
            (ENV_MODEL, "gemini-1.5-pro"),
            (ENV_REMOTE_TIMEOUT_MS, "2500"),
            (ENV_CACHE_TTL_SECS, "60"),
            (ENV_CACHE_CAPACITY, "10"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.remote_timeout, Duration::from_millis(2500));
        assert_eq!(config.cache.default_ttl, Duration::from_secs(60));
        assert_eq!(config.cache.max_entries, 10);
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = IntelConfig::from_lookup(lookup(&[(ENV_API_KEY, "   "), (ENV_MODEL, "")])).unwrap();
        assert!(!config.has_api_key());
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let result = IntelConfig::from_lookup(lookup(&[(ENV_REMOTE_TIMEOUT_MS, "soon")]));
        assert!(matches!(result, Err(IntelError::ConfigError(_))));

        let result = IntelConfig::from_lookup(lookup(&[(ENV_CACHE_CAPACITY, "0")]));
        assert!(matches!(result, Err(IntelError::ConfigError(_))));

        let result = IntelConfig::from_lookup(lookup(&[(ENV_REMOTE_TIMEOUT_MS, "0")]));
        assert!(matches!(result, Err(IntelError::ConfigError(_))));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = IntelConfig::default().with_api_key("super-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
