//! Core type definitions for the cache system

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cache key type - derived from content fingerprints, see [`crate::cache::CacheKeyBuilder`]
pub type CacheKey = String;

/// Statistics and metrics for cache performance monitoring
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered from a live entry
    pub hits: u64,

    /// Lookups that started a new computation
    pub misses: u64,

    /// Lookups that joined a computation already in flight
    pub coalesced: u64,

    /// Number of entries currently in cache
    pub entries: usize,

    /// Number of evictions due to the capacity limit (LRU)
    pub evictions_capacity: u64,

    /// Number of evictions due to TTL expiration
    pub evictions_ttl: u64,

    /// Number of explicit invalidations (by key, tag or clear)
    pub invalidations: u64,

    /// Computations that failed and were therefore not cached
    pub compute_failures: u64,
}

impl CacheStats {
    /// Calculate cache hit rate as a percentage.
    ///
    /// Coalesced lookups count as hits: they did not trigger a computation.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.coalesced;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            (served as f64 / total as f64) * 100.0
        }
    }

    /// Calculate miss rate as a percentage
    pub fn miss_rate(&self) -> f64 {
        100.0 - self.hit_rate()
    }

    /// Calculate total evictions
    pub fn total_evictions(&self) -> u64 {
        self.evictions_capacity + self.evictions_ttl
    }

    /// Sum of two caches' statistics
    pub fn combine(&self, other: &CacheStats) -> CacheStats {
        CacheStats {
            hits: self.hits + other.hits,
            misses: self.misses + other.misses,
            coalesced: self.coalesced + other.coalesced,
            entries: self.entries + other.entries,
            evictions_capacity: self.evictions_capacity + other.evictions_capacity,
            evictions_ttl: self.evictions_ttl + other.evictions_ttl,
            invalidations: self.invalidations + other.invalidations,
            compute_failures: self.compute_failures + other.compute_failures,
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheStats {{ hits: {}, misses: {}, coalesced: {}, hit_rate: {:.2}%, entries: {}, evictions: {}, failures: {} }}",
            self.hits,
            self.misses,
            self.coalesced,
            self.hit_rate(),
            self.entries,
            self.total_evictions(),
            self.compute_failures
        )
    }
}
