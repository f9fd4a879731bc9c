//! # Memoization Cache
//!
//! A generic key → result cache used to keep expensive computations (remote
//! summaries, question sets) from running more than once per input.
//!
//! ## Features
//!
//! - **Singleflight**: at most one concurrent computation per key; concurrent
//!   callers await the same computation and observe the same value
//! - **Failures are not cached**: the next call after a failed computation retries
//! - **TTL-Based Expiration**: checked lazily on access, with an optional
//!   background sweep
//! - **LRU Eviction**: the least recently used entry is evicted before an insert
//!   would exceed capacity
//! - **Dependency Invalidation**: entries can be tagged with the inputs they were
//!   derived from and invalidated by tag
//!
//! ## Example
//!
//! ```rust
//! use lesson_intel::cache::{CacheConfig, CacheKeyBuilder, MemoCache, Operation};
//! use std::time::Duration;
//!
//! # async fn example() -> lesson_intel::Result<()> {
//! let config = CacheConfig::builder()
//!     .default_ttl(Duration::from_secs(3600))
//!     .max_entries(500)
//!     .build();
//!
//! let cache: MemoCache<String> = MemoCache::new(config)?;
//! let key = CacheKeyBuilder::new(Operation::Summary)
//!     .content("Water covers 71% of the Earth.")
//!     .build();
//!
//! let summary = cache
//!     .get_or_compute(key, || async { Ok("Water covers most of the planet.".to_string()) })
//!     .await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod invalidation;
pub mod key;
pub mod memoize;
pub mod store;
pub mod types;

pub use config::{CacheConfig, CacheConfigBuilder};
pub use entry::{CacheEntry, CacheMetadata};
pub use invalidation::{InvalidationEvent, InvalidationReason};
pub use key::{fingerprint, CacheKeyBuilder, Operation};
pub use memoize::{memoize, Memoized};
pub use store::{spawn_auto_cleanup, ComputeOptions, MemoCache};
pub use types::{CacheKey, CacheStats};
