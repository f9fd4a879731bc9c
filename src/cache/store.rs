//! Memoization store with LRU eviction, lazy TTL expiry and in-flight de-duplication

use crate::cache::{
    config::CacheConfig,
    entry::CacheEntry,
    invalidation::{InvalidationEvent, InvalidationReason},
    types::{CacheKey, CacheStats},
};
use crate::error::{IntelError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type Computation<V> = Shared<BoxFuture<'static, Result<V>>>;

/// Per-call options for [`MemoCache::get_or_compute_with`]
#[derive(Debug, Clone, Default)]
pub struct ComputeOptions {
    /// TTL for the stored result; the cache default applies when unset
    pub ttl: Option<Duration>,

    /// Tags naming the inputs the result depends on
    pub tags: Vec<String>,
}

impl ComputeOptions {
    /// Options with cache defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the TTL
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Add a dependency tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Generic key → result cache
///
/// This implementation provides:
/// - Async access via a tokio `RwLock` that is never held across a computation
/// - At most one concurrent computation per key; concurrent callers share it
/// - Lazy TTL expiration checked on access
/// - LRU eviction when an insert would exceed `max_entries`
/// - Tag-based invalidation of entries derived from a changed input
///
/// Computations run as spawned tasks, so they make progress (and settle their
/// result into the cache) even when every caller has stopped waiting. Failed
/// computations are never stored: every caller waiting on the failed
/// computation receives the error, and the next call retries.
///
/// Must be used from within a tokio runtime.
pub struct MemoCache<V> {
    /// Cache configuration
    pub(crate) config: CacheConfig,

    /// Internal storage
    store: Arc<RwLock<CacheStore<V>>>,

    /// Source of flight identifiers
    next_flight: AtomicU64,
}

/// Internal cache storage
struct CacheStore<V> {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry<V>>,

    /// LRU tracking: front is least recently used
    lru_queue: VecDeque<CacheKey>,

    /// Computations currently running, by key
    in_flight: HashMap<CacheKey, Flight<V>>,

    /// Current cache statistics
    stats: CacheStats,

    /// Copied from the config
    max_entries: usize,
    enable_metrics: bool,
}

/// A computation in progress for one key
struct Flight<V> {
    id: u64,
    ttl: Duration,
    tags: Vec<String>,
    computation: Computation<V>,
}

impl<V> MemoCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        info!("Initializing memo cache with config: {:?}", config);

        let store = CacheStore {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            in_flight: HashMap::new(),
            stats: CacheStats::default(),
            max_entries: config.max_entries,
            enable_metrics: config.enable_metrics,
        };

        Ok(Self {
            config,
            store: Arc::new(RwLock::new(store)),
            next_flight: AtomicU64::new(0),
        })
    }

    /// The configuration this cache was built with
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Return the cached value for `key`, or run `compute` and cache its result
    pub async fn get_or_compute<F, Fut>(&self, key: impl Into<CacheKey>, compute: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        self.get_or_compute_with(key, ComputeOptions::default(), compute)
            .await
    }

    /// Like [`MemoCache::get_or_compute`] for a synchronous producer
    pub async fn get_or_compute_sync<F>(&self, key: impl Into<CacheKey>, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        self.get_or_compute(key, move || futures::future::ready(compute()))
            .await
    }

    /// Return the cached value for `key`, or run `compute` and cache its result
    /// with the given options
    ///
    /// `compute` is only invoked on a miss with no computation for `key` in
    /// flight; otherwise the caller awaits the running computation. Dropping
    /// the returned future stops waiting but does not stop the computation.
    pub async fn get_or_compute_with<F, Fut>(
        &self,
        key: impl Into<CacheKey>,
        options: ComputeOptions,
        compute: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        if options.ttl.is_some_and(|ttl| ttl.is_zero()) {
            return Err(IntelError::InvalidArgument(
                "ttl must be greater than 0".to_string(),
            ));
        }

        let key = key.into();

        let computation = {
            let mut store = self.store.write().await;

            if let Some(value) = store.lookup(&key) {
                return Ok(value);
            }

            if let Some(flight) = store.in_flight.get(&key) {
                let joined = flight.computation.clone();
                debug!("Joining in-flight computation: {}", key);
                store.record(|stats| stats.coalesced += 1);
                joined
            } else {
                debug!("Cache miss, computing: {}", key);
                store.record(|stats| stats.misses += 1);

                let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
                let ttl = self
                    .config
                    .jittered(options.ttl.unwrap_or(self.config.default_ttl));
                let computation = self.spawn_flight(key.clone(), id, compute());

                store.in_flight.insert(
                    key.clone(),
                    Flight {
                        id,
                        ttl,
                        tags: options.tags,
                        computation: computation.clone(),
                    },
                );
                computation
            }
        };

        computation.await
    }

    /// Internal: run a computation on its own task and settle it when done
    ///
    /// The task settles the flight before its handle resolves, so waiters
    /// always observe the stored entry.
    fn spawn_flight<Fut>(&self, key: CacheKey, id: u64, compute: Fut) -> Computation<V>
    where
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let store = Arc::clone(&self.store);

        let handle = tokio::spawn(async move {
            let result = match AssertUnwindSafe(compute).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!("Computation for {} panicked", key);
                    Err(IntelError::Other(format!("computation for {} panicked", key)))
                }
            };
            store.write().await.settle_flight(&key, id, &result);
            result
        });

        handle
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    Err(IntelError::Cancelled(format!("computation task stopped: {}", e)))
                })
            })
            .boxed()
            .shared()
    }

    /// Check if a live entry exists for `key` (does not affect LRU order)
    pub async fn contains_key(&self, key: &str) -> bool {
        let store = self.store.read().await;
        store
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired())
    }

    /// Remove the entry for `key` immediately, regardless of TTL or capacity state
    ///
    /// A computation in flight for `key` is abandoned: its current waiters still
    /// receive its result, but the result is not stored.
    pub async fn invalidate(&self, key: &str) -> bool {
        let mut store = self.store.write().await;

        let removed = store.remove_entry(key);
        let abandoned = store.in_flight.remove(key).is_some();

        if removed {
            store.record(|stats| stats.invalidations += 1);
            debug!("Invalidated cache entry: {}", key);
        }
        if abandoned {
            debug!("Abandoned in-flight computation: {}", key);
        }

        removed || abandoned
    }

    /// Invalidate every entry (and in-flight computation) tagged with `tag`
    pub async fn invalidate_tag(&self, tag: &str) -> InvalidationEvent {
        let mut store = self.store.write().await;

        let keys: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.has_tag(tag))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &keys {
            store.remove_entry(key);
        }
        store
            .in_flight
            .retain(|_, flight| !flight.tags.iter().any(|t| t == tag));

        let removed = keys.len() as u64;
        store.record(|stats| stats.invalidations += removed);
        info!("Invalidated {} entries with tag: {}", keys.len(), tag);

        InvalidationEvent::new(
            InvalidationReason::TagMatch {
                tag: tag.to_string(),
            },
            keys,
        )
    }

    /// Clear all entries from the cache and abandon in-flight computations
    pub async fn clear(&self) -> InvalidationEvent {
        let mut store = self.store.write().await;

        let keys: Vec<CacheKey> = store.entries.keys().cloned().collect();
        store.entries.clear();
        store.lru_queue.clear();
        store.in_flight.clear();

        let removed = keys.len() as u64;
        store.record(|stats| stats.invalidations += removed);
        info!("Cleared {} entries from cache", keys.len());

        InvalidationEvent::new(InvalidationReason::Cleared, keys)
    }

    /// Remove all expired entries
    pub async fn cleanup_expired(&self) -> InvalidationEvent {
        let mut store = self.store.write().await;

        let expired_keys: Vec<CacheKey> = store
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            store.remove_entry(key);
        }

        let removed = expired_keys.len() as u64;
        store.record(|stats| stats.evictions_ttl += removed);

        if !expired_keys.is_empty() {
            debug!("Cleaned up {} expired entries", expired_keys.len());
        }

        let count = expired_keys.len();
        InvalidationEvent::new(InvalidationReason::Expired, expired_keys)
            .with_context(format!("Cleaned up {} expired entries", count))
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let mut stats = store.stats.clone();
        stats.entries = store.entries.len();
        stats
    }

    /// Get number of entries in cache (expired-but-unaccessed entries included)
    pub async fn len(&self) -> usize {
        let store = self.store.read().await;
        store.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let store = self.store.read().await;
        store.entries.is_empty()
    }

    /// Number of computations currently in flight
    pub async fn in_flight(&self) -> usize {
        let store = self.store.read().await;
        store.in_flight.len()
    }
}

impl<V: Clone> CacheStore<V> {
    /// Serve a live entry, dropping it if it has expired
    fn lookup(&mut self, key: &str) -> Option<V> {
        let hit = match self.entries.get_mut(key) {
            None => return None,
            Some(entry) if entry.is_expired() => None,
            Some(entry) => {
                entry.mark_accessed();
                Some(entry.value.clone())
            }
        };

        match hit {
            Some(value) => {
                self.lru_queue.retain(|k| k != key);
                self.lru_queue.push_back(key.to_string());
                self.record(|stats| stats.hits += 1);
                debug!("Cache hit: {}", key);
                Some(value)
            }
            None => {
                debug!("Cache entry expired: {}", key);
                self.remove_entry(key);
                self.record(|stats| stats.evictions_ttl += 1);
                None
            }
        }
    }

    /// Settle a flight once its computation has resolved
    ///
    /// A flight abandoned by invalidation is no longer registered (or has been
    /// replaced by a newer one) and its result is discarded.
    fn settle_flight(&mut self, key: &str, flight_id: u64, result: &Result<V>) {
        let owns_flight = self
            .in_flight
            .get(key)
            .is_some_and(|flight| flight.id == flight_id);
        if !owns_flight {
            debug!("Discarding result of abandoned computation: {}", key);
            return;
        }
        let Some(flight) = self.in_flight.remove(key) else {
            return;
        };

        match result {
            Ok(value) => {
                self.insert_entry(key.to_string(), value.clone(), flight.ttl, flight.tags);
            }
            Err(e) => {
                self.record(|stats| stats.compute_failures += 1);
                debug!("Computation for {} failed, not caching: {}", key, e);
            }
        }
    }

    /// Store a computed value, evicting the LRU entry if at capacity
    fn insert_entry(&mut self, key: CacheKey, value: V, ttl: Duration, tags: Vec<String>) {
        let mut entry = CacheEntry::new(key.clone(), value, ttl);
        for tag in tags {
            entry.add_tag(tag);
        }

        if self.entries.contains_key(&key) {
            debug!("Replacing cache entry: {}", key);
            self.lru_queue.retain(|k| k != &key);
        } else {
            self.evict_if_needed();
            debug!("Inserting new cache entry: {}", key);
        }

        self.entries.insert(key.clone(), entry);
        self.lru_queue.push_back(key);
    }

    /// Make room for one more entry
    fn evict_if_needed(&mut self) {
        while self.entries.len() >= self.max_entries {
            let Some(key) = self.lru_queue.pop_front() else {
                warn!("LRU queue empty while cache is at capacity");
                break;
            };
            if self.entries.remove(&key).is_some() {
                debug!("Evicting entry due to max_entries limit: {}", key);
                self.record(|stats| stats.evictions_capacity += 1);
            }
        }
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.lru_queue.retain(|k| k != key);
            true
        } else {
            false
        }
    }

    /// Update statistics when metrics are enabled
    fn record(&mut self, update: impl FnOnce(&mut CacheStats)) {
        if self.enable_metrics {
            update(&mut self.stats);
        }
    }
}

/// Background task sweeping expired entries
///
/// Returns `None` when `enable_auto_cleanup` is off. The task stops on its own
/// once the cache has been dropped.
pub fn spawn_auto_cleanup<V>(cache: &Arc<MemoCache<V>>) -> Option<JoinHandle<()>>
where
    V: Clone + Send + Sync + 'static,
{
    if !cache.config.enable_auto_cleanup {
        return None;
    }

    let interval = cache.config.cleanup_interval;
    let weak: Weak<MemoCache<V>> = Arc::downgrade(cache);

    info!("Starting automatic cache cleanup task (interval: {:?})", interval);

    Some(tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            let Some(cache) = weak.upgrade() else {
                debug!("Cache dropped, stopping cleanup task");
                break;
            };

            let event = cache.cleanup_expired().await;
            if !event.is_empty() {
                debug!("Auto cleanup removed {} entries", event.len());
            }
        }
    }))
}
