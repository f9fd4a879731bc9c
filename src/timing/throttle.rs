//! Leading-edge throttle with a trailing call

use crate::error::{IntelError, Result};
use crate::timing::settled::Settled;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

type Callback<A, R> = Box<dyn Fn(A) -> R + Send + Sync>;

/// Runs a function at most once per `interval`
///
/// The first call runs immediately. Calls arriving inside the interval are
/// collapsed into one trailing invocation with the latest arguments, which runs
/// once the interval since the previous invocation has elapsed. Over any window
/// of length `D` the function runs at most `floor(D / interval) + 1` times.
pub struct Throttle<A, R> {
    inner: Arc<ThrottleInner<A, R>>,
}

struct ThrottleInner<A, R> {
    interval: Duration,
    func: Callback<A, R>,
    state: Mutex<ThrottleState<A, R>>,
}

struct ThrottleState<A, R> {
    last_invoked_at: Option<Instant>,
    trailing_args: Option<A>,
    trailing_timer: Option<JoinHandle<()>>,
    waiters: Vec<oneshot::Sender<R>>,
    generation: u64,
}

impl<A, R> Throttle<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Wrap `func` so that it runs at most once per `interval`
    pub fn new<F>(interval: Duration, func: F) -> Result<Self>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(IntelError::InvalidArgument(
                "throttle interval must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            inner: Arc::new(ThrottleInner {
                interval,
                func: Box::new(func),
                state: Mutex::new(ThrottleState {
                    last_invoked_at: None,
                    trailing_args: None,
                    trailing_timer: None,
                    waiters: Vec::new(),
                    generation: 0,
                }),
            }),
        })
    }

    /// Invoke now if the interval allows it, otherwise schedule a trailing call
    pub fn call(&self, args: A) -> Settled<R> {
        let now = Instant::now();
        let mut state = self.inner.state.lock();

        let window_open = state
            .last_invoked_at
            .map_or(true, |last| now.duration_since(last) >= self.inner.interval);

        if window_open && state.trailing_timer.is_none() {
            state.last_invoked_at = Some(now);
            drop(state);

            debug!("Throttled call running on leading edge");
            return Settled::ready((self.inner.func)(args));
        }

        let (tx, rx) = oneshot::channel();
        state.trailing_args = Some(args);
        state.waiters.push(tx);

        if state.trailing_timer.is_none() {
            // Only reached with the window closed, so last_invoked_at is set
            let fire_at = state
                .last_invoked_at
                .map_or(now, |last| last + self.inner.interval);
            let generation = state.generation;
            let inner = Arc::clone(&self.inner);
            state.trailing_timer = Some(tokio::spawn(async move {
                tokio::time::sleep_until(fire_at).await;
                inner.fire_trailing(generation);
            }));
            debug!(
                "Throttled call deferred by {:?}",
                fire_at.saturating_duration_since(now)
            );
        }

        Settled::new(rx)
    }

    /// Drop the trailing call, if any
    ///
    /// The time of the last invocation is kept, so the next call still honors
    /// the interval.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.state.lock();

        let had_pending = state.trailing_args.is_some();
        if let Some(timer) = state.trailing_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.trailing_args = None;
        state.waiters.clear();

        if had_pending {
            debug!("Throttled trailing call cancelled");
        }
        had_pending
    }

    /// Whether a trailing call is scheduled
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().trailing_args.is_some()
    }
}

impl<A, R> ThrottleInner<A, R>
where
    R: Clone,
{
    fn fire_trailing(&self, generation: u64) {
        let (args, waiters) = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.trailing_timer = None;
            let Some(args) = state.trailing_args.take() else {
                return;
            };
            state.last_invoked_at = Some(Instant::now());
            (args, std::mem::take(&mut state.waiters))
        };

        debug!("Throttled call running on trailing edge");
        let result = (self.func)(args);
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }
}

impl<A, R> Clone for Throttle<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for Throttle<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttle")
            .field("interval", &self.inner.interval)
            .finish()
    }
}
