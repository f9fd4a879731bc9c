//! Cache key derivation
//!
//! Keys are `"<operation>:<fingerprint>[?k=v&...]"`. The fingerprint is a
//! truncated SHA-256 of the input text, so long lesson bodies produce short
//! keys, and the operation prefix keeps a summary and a question set of the
//! same text apart.

use crate::cache::types::CacheKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Number of digest bytes kept in a fingerprint (hex encoded to twice as many chars)
const FINGERPRINT_BYTES: usize = 16;

/// Operation discriminator for cache keys
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Text summary
    Summary,

    /// Quiz question set
    Questions,

    /// Any other memoized computation
    Custom(String),
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Summary => write!(f, "summary"),
            Operation::Questions => write!(f, "questions"),
            Operation::Custom(s) => write!(f, "custom:{}", s),
        }
    }
}

/// Deterministic fingerprint of a piece of content
pub fn fingerprint(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

/// Cache key builder
pub struct CacheKeyBuilder {
    operation: Operation,
    identifier: String,
    params: Vec<(String, String)>,
}

impl CacheKeyBuilder {
    /// Create a new cache key builder
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            identifier: String::new(),
            params: Vec::new(),
        }
    }

    /// Identify the key by the fingerprint of `content`
    pub fn content(mut self, content: &str) -> Self {
        self.identifier = fingerprint(content);
        self
    }

    /// Set the primary identifier verbatim
    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = id.into();
        self
    }

    /// Add a parameter to the key
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Build the cache key
    pub fn build(self) -> CacheKey {
        let mut key = format!("{}:{}", self.operation, self.identifier);

        if !self.params.is_empty() {
            let params_str: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            key.push('?');
            key.push_str(&params_str.join("&"));
        }

        key
    }
}
