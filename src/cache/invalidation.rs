//! Cache invalidation events
//!
//! Bulk removals (expiry sweeps, tag invalidation, clear) report what they
//! removed as an [`InvalidationEvent`]. Single-key invalidation and LRU
//! eviction are only counted in [`crate::cache::CacheStats`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason for cache invalidation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Entry expired based on TTL
    Expired,

    /// Invalidated because an input it was derived from changed
    TagMatch { tag: String },

    /// Whole cache cleared
    Cleared,
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::Expired => write!(f, "TTL expired"),
            InvalidationReason::TagMatch { tag } => write!(f, "tag match: {}", tag),
            InvalidationReason::Cleared => write!(f, "cache cleared"),
        }
    }
}

/// Event for cache invalidation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Keys that were invalidated
    pub keys: Vec<String>,

    /// Additional context
    pub context: Option<String>,
}

impl InvalidationEvent {
    /// Create a new invalidation event
    pub fn new(reason: InvalidationReason, keys: Vec<String>) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            keys,
            context: None,
        }
    }

    /// Add context to the event
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }

    /// Number of keys removed
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether nothing was removed
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
