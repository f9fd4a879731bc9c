//! Function memoization on top of [`MemoCache`]

use crate::cache::store::MemoCache;
use crate::cache::types::CacheKey;
use crate::error::Result;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// A function whose results are memoized by a derived key
///
/// ```no_run
/// use lesson_intel::cache::{memoize, CacheConfig, CacheKeyBuilder, MemoCache, Operation};
/// use std::sync::Arc;
///
/// # async fn example() -> lesson_intel::Result<()> {
/// let cache = Arc::new(MemoCache::new(CacheConfig::default())?);
/// let word_count = memoize(
///     cache,
///     |text: &String| CacheKeyBuilder::new(Operation::Custom("words".into())).content(text).build(),
///     |text: String| async move { Ok(text.split_whitespace().count()) },
/// );
///
/// assert_eq!(word_count.call("one two three".to_string()).await?, 3);
/// # Ok(())
/// # }
/// ```
pub struct Memoized<A, V, K, F> {
    cache: Arc<MemoCache<V>>,
    key_fn: K,
    compute: F,
    _args: PhantomData<fn(A)>,
}

/// Wrap `compute` so that calls with the same derived key share one result
pub fn memoize<A, V, K, F>(cache: Arc<MemoCache<V>>, key_fn: K, compute: F) -> Memoized<A, V, K, F> {
    Memoized::new(cache, key_fn, compute)
}

impl<A, V, K, F> Memoized<A, V, K, F> {
    /// Create a memoized function over an existing cache
    pub fn new(cache: Arc<MemoCache<V>>, key_fn: K, compute: F) -> Self {
        Self {
            cache,
            key_fn,
            compute,
            _args: PhantomData,
        }
    }

    /// The backing cache
    pub fn cache(&self) -> &Arc<MemoCache<V>> {
        &self.cache
    }
}

impl<A, V, K, F, Fut> Memoized<A, V, K, F>
where
    V: Clone + Send + Sync + 'static,
    K: Fn(&A) -> CacheKey,
    F: Fn(A) -> Fut,
    Fut: Future<Output = Result<V>> + Send + 'static,
{
    /// Call the function, serving a cached result when one exists
    pub async fn call(&self, args: A) -> Result<V> {
        let key = (self.key_fn)(&args);
        self.cache.get_or_compute(key, || (self.compute)(args)).await
    }

    /// Forget the cached result for `args`
    pub async fn invalidate(&self, args: &A) -> bool {
        let key = (self.key_fn)(args);
        self.cache.invalidate(&key).await
    }
}
