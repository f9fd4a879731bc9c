//! Ordered fallback execution

use crate::error::{IntelError, Result};
use crate::fallback::result::{FallbackResult, TierFailure};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, warn};

type TierFn<'a, V> = Box<dyn FnOnce() -> BoxFuture<'a, Result<V>> + Send + 'a>;
type Validator<'a, V> = Box<dyn Fn(&V) -> bool + Send + Sync + 'a>;

/// One strategy of a fallback chain
///
/// Remote tiers carry a timeout; when it elapses the tier's future is dropped
/// and the chain moves on.
pub struct Tier<'a, V> {
    name: String,
    timeout: Option<Duration>,
    run: TierFn<'a, V>,
}

impl<'a, V> Tier<'a, V> {
    /// A tier bounded by `timeout`
    pub fn remote<F, Fut>(name: impl Into<String>, timeout: Duration, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<V>> + Send + 'a,
    {
        Self {
            name: name.into(),
            timeout: Some(timeout),
            run: Box::new(move || f().boxed()),
        }
    }

    /// A tier that runs to completion
    pub fn local<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<V>> + Send + 'a,
    {
        Self {
            name: name.into(),
            timeout: None,
            run: Box::new(move || f().boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    async fn attempt(self) -> Result<V> {
        let name = self.name;
        let future = (self.run)();

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, future)
                .await
                .map_err(|_| IntelError::TimeoutError {
                    timeout_ms: timeout.as_millis() as u64,
                    context: format!("tier '{}'", name),
                })?,
            None => future.await,
        }
    }
}

impl<V> fmt::Debug for Tier<'_, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tier")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for a chain of tiers tried strictly in order
///
/// ```no_run
/// use lesson_intel::fallback::{FallbackChain, ServedBy};
/// use lesson_intel::IntelError;
/// use std::time::Duration;
///
/// # async fn example() -> lesson_intel::Result<()> {
/// let result = FallbackChain::new()
///     .remote("remote", Duration::from_secs(2), || async {
///         Err(IntelError::NotConfigured("no API key".into()))
///     })
///     .local("local", || async { Ok("heuristic".to_string()) })
///     .validate(|s: &String| !s.trim().is_empty())
///     .run()
///     .await?;
///
/// assert_eq!(result.tier, ServedBy::Fallback);
/// # Ok(())
/// # }
/// ```
pub struct FallbackChain<'a, V> {
    tiers: Vec<Tier<'a, V>>,
    validator: Option<Validator<'a, V>>,
}

impl<'a, V: Send + 'a> FallbackChain<'a, V> {
    pub fn new() -> Self {
        Self {
            tiers: Vec::new(),
            validator: None,
        }
    }

    pub fn tier(mut self, tier: Tier<'a, V>) -> Self {
        self.tiers.push(tier);
        self
    }

    pub fn remote<F, Fut>(self, name: impl Into<String>, timeout: Duration, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<V>> + Send + 'a,
    {
        self.tier(Tier::remote(name, timeout, f))
    }

    pub fn local<F, Fut>(self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<V>> + Send + 'a,
    {
        self.tier(Tier::local(name, f))
    }

    /// Accept a tier's value only if `validator` returns true
    ///
    /// Without a validator every `Ok` value is accepted.
    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&V) -> bool + Send + Sync + 'a,
    {
        self.validator = Some(Box::new(validator));
        self
    }

    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }

    /// Try each tier in turn and return the first accepted value
    pub async fn run(self) -> Result<FallbackResult<V>> {
        match self.validator {
            Some(validator) => run(self.tiers, validator).await,
            None => run(self.tiers, |_: &V| true).await,
        }
    }
}

impl<'a, V: Send + 'a> Default for FallbackChain<'a, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Try `tiers` strictly in order until one resolves with a value `validate` accepts
///
/// Failures of non-terminal tiers are logged at warn level and recorded on the
/// result. When every tier fails the error lists each tier's reason. A tier
/// error that is not [transient](IntelError::is_transient) is a caller bug and
/// is returned as is, without trying later tiers.
pub async fn run<'a, V, F>(tiers: Vec<Tier<'a, V>>, validate: F) -> Result<FallbackResult<V>>
where
    F: Fn(&V) -> bool,
{
    if tiers.is_empty() {
        return Err(IntelError::InvalidArgument(
            "fallback chain needs at least one tier".to_string(),
        ));
    }

    let tier_count = tiers.len();
    let mut failures = Vec::new();

    for (tier_index, tier) in tiers.into_iter().enumerate() {
        let tier_name = tier.name.clone();
        let started = Instant::now();
        debug!("Trying tier {} '{}'", tier_index, tier_name);

        let error = match tier.attempt().await {
            Ok(value) if validate(&value) => {
                debug!(
                    "Tier {} '{}' succeeded in {:?}",
                    tier_index,
                    tier_name,
                    started.elapsed()
                );
                return Ok(FallbackResult::new(value, tier_index, tier_name, failures));
            }
            Ok(_) => IntelError::ValidationFailed {
                tier: tier_name.clone(),
            },
            Err(error) if !error.is_transient() => {
                error!("Tier {} '{}' failed with a non-recoverable error: {}", tier_index, tier_name, error);
                return Err(error);
            }
            Err(error) => error,
        };

        let elapsed = started.elapsed();
        if tier_index + 1 < tier_count {
            warn!(
                "Fallback tier {} '{}' failed after {:?}, trying next: {}",
                tier_index, tier_name, elapsed, error
            );
        }

        failures.push(TierFailure {
            tier_index,
            tier_name,
            error,
            elapsed,
        });
    }

    Err(IntelError::AllTiersFailed { failures })
}
