//! Tagged outcome of a fallback chain

use crate::error::IntelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which kind of tier produced a value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServedBy {
    /// The first tier of the chain
    Primary,
    /// Any later tier
    Fallback,
}

impl ServedBy {
    pub fn from_index(tier_index: usize) -> Self {
        if tier_index == 0 {
            ServedBy::Primary
        } else {
            ServedBy::Fallback
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServedBy::Primary => "primary",
            ServedBy::Fallback => "fallback",
        }
    }
}

impl fmt::Display for ServedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier that was tried and did not produce an accepted value
#[derive(Debug, Clone)]
pub struct TierFailure {
    pub tier_index: usize,
    pub tier_name: String,
    pub error: IntelError,
    pub elapsed: Duration,
}

impl fmt::Display for TierFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.tier_index, self.tier_name, self.error)
    }
}

/// The accepted value of a chain, tagged with the tier that served it
///
/// `failures` holds every tier tried before the serving one, in order, so a
/// degraded result still explains why the primary path was skipped.
/// Tier name of [`FallbackResult::unattempted`]
pub const UNATTEMPTED_TIER: &str = "none";

#[derive(Debug, Clone)]
pub struct FallbackResult<V> {
    pub value: V,
    pub tier: ServedBy,
    pub tier_index: usize,
    pub tier_name: String,
    pub failures: Vec<TierFailure>,
}

impl<V> FallbackResult<V> {
    /// Result served by the tier at `tier_index`
    pub fn new(value: V, tier_index: usize, tier_name: impl Into<String>, failures: Vec<TierFailure>) -> Self {
        Self {
            value,
            tier: ServedBy::from_index(tier_index),
            tier_index,
            tier_name: tier_name.into(),
            failures,
        }
    }

    /// Result that needed no tier at all (nothing to compute)
    ///
    /// Reported as index 0 under the name `"none"` and never degraded.
    pub fn unattempted(value: V) -> Self {
        Self::new(value, 0, UNATTEMPTED_TIER, Vec::new())
    }

    /// The primary tier's failure, if the value came from a fallback
    pub fn error(&self) -> Option<&IntelError> {
        self.failures.first().map(|failure| &failure.error)
    }

    pub fn is_degraded(&self) -> bool {
        self.tier == ServedBy::Fallback
    }

    /// Transform the value, keeping the provenance
    pub fn map<U, F>(self, f: F) -> FallbackResult<U>
    where
        F: FnOnce(V) -> U,
    {
        FallbackResult {
            value: f(self.value),
            tier: self.tier,
            tier_index: self.tier_index,
            tier_name: self.tier_name,
            failures: self.failures,
        }
    }

    pub fn into_value(self) -> V {
        self.value
    }
}
