//! Cache entry management with TTL support
//!
//! Timestamps use `tokio::time::Instant` so that expiry follows the runtime
//! clock, including a paused test clock.

use crate::cache::types::CacheKey;
use std::time::Duration;
use tokio::time::Instant;

/// A cache entry with TTL and metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: V,

    /// Entry metadata
    pub metadata: CacheMetadata,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry that expires after `ttl`
    pub fn new(key: CacheKey, value: V, ttl: Duration) -> Self {
        let now = Instant::now();

        Self {
            key,
            value,
            metadata: CacheMetadata {
                created_at: now,
                accessed_at: now,
                expires_at: now + ttl,
                access_count: 0,
                tags: Vec::new(),
            },
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.metadata.expires_at
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self) {
        self.metadata.accessed_at = Instant::now();
        self.metadata.access_count += 1;
    }

    /// Add a tag to the entry for dependency invalidation
    pub fn add_tag(&mut self, tag: String) {
        if !self.metadata.tags.contains(&tag) {
            self.metadata.tags.push(tag);
        }
    }

    /// Check if entry has a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.iter().any(|t| t == tag)
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone)]
pub struct CacheMetadata {
    /// When the entry was created
    pub created_at: Instant,

    /// Last access time (for LRU tracking)
    pub accessed_at: Instant,

    /// When the entry expires
    pub expires_at: Instant,

    /// Number of cache hits served by this entry
    pub access_count: u64,

    /// Tags naming the inputs this entry was derived from
    pub tags: Vec<String>,
}
