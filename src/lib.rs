//! # Lesson Intelligence (lesson-intel)
//!
//! A resilient computation layer for a learning product: lesson summaries and
//! study questions that keep working, with reduced quality, when the remote
//! generative model is unavailable.
//!
//! ## Features
//!
//! - Debounce and throttle wrappers for bursty call sites
//! - Memoization cache with TTL, LRU eviction, tag invalidation and
//!   singleflight de-duplication
//! - Fallback-chain executor that tags every result with the tier that served it
//! - Gemini-backed summaries and questions with deterministic local heuristics
//!   as the fallback tier
//!
//! ## Content Intelligence
//!
//! Without an API key the service runs in fallback-only mode and every call is
//! answered by the local heuristics.
//!
//! ```no_run
//! use lesson_intel::{ContentIntelligence, IntelConfig};
//!
//! #[tokio::main]
//! async fn main() -> lesson_intel::Result<()> {
//!     lesson_intel::logging::init("lesson_intel=info");
//!
//!     let service = ContentIntelligence::from_config(IntelConfig::from_env()?)?;
//!     let text = "Water is the driving force of all nature. It covers 71% of the Earth.";
//!
//!     println!("{}", service.summarize(text).await);
//!     for question in service.generate_questions(text, 3).await {
//!         println!("- {}", question);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Fallback Chains
//!
//! ```no_run
//! use lesson_intel::fallback::{FallbackChain, ServedBy};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> lesson_intel::Result<()> {
//!     let result = FallbackChain::new()
//!         .remote("remote", Duration::from_millis(500), || async {
//!             tokio::time::sleep(Duration::from_secs(5)).await;
//!             Ok(vec!["too late".to_string()])
//!         })
//!         .local("local", || async { Ok(vec!["on time".to_string()]) })
//!         .validate(|v: &Vec<String>| !v.is_empty())
//!         .run()
//!         .await?;
//!
//!     assert_eq!(result.tier, ServedBy::Fallback);
//!     Ok(())
//! }
//! ```
//!
//! ## Debounce
//!
//! ```no_run
//! use lesson_intel::timing::Debounce;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> lesson_intel::Result<()> {
//!     let save = Debounce::new(Duration::from_millis(250), |draft: String| draft.len())?;
//!
//!     for draft in ["W", "Wa", "Wat", "Water"] {
//!         let _ = save.call(draft.to_string());
//!     }
//!     assert_eq!(save.call("Water!".to_string()).await?, 6);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod fallback;
pub mod intel;
pub mod lessons;
pub mod logging;
pub mod timing;

// Re-export main types for convenience
pub use cache::{
    memoize, CacheConfig, CacheConfigBuilder, CacheEntry, CacheKey, CacheKeyBuilder, CacheMetadata,
    CacheStats, ComputeOptions, InvalidationEvent, InvalidationReason, MemoCache, Memoized,
    Operation,
};
pub use config::IntelConfig;
pub use error::{IntelError, Result};
pub use fallback::{FallbackChain, FallbackResult, ServedBy, Tier, TierFailure};
pub use intel::{
    local_questions_fallback, local_summary_fallback, ContentIntelligence, GeminiClient,
    GenerativeClient, Respondable,
};
pub use lessons::{Lesson, LessonCatalog};
pub use timing::{Debounce, Settled, Throttle};
