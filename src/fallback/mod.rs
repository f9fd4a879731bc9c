//! # Fallback Chain
//!
//! Runs alternative strategies for one computation in order and returns the
//! first value that resolves without error and passes validation. The result
//! is tagged with the tier that served it, so degradation is a value the caller
//! can inspect rather than a swallowed exception.

pub mod chain;
pub mod result;

pub use chain::{run, FallbackChain, Tier};
pub use result::{FallbackResult, ServedBy, TierFailure, UNATTEMPTED_TIER};
