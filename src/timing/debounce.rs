//! Trailing-edge debounce

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

/// Delays invocation of a function until calls have been quiet for `wait`
///
/// Each [`Debounce::call`] cancels the pending invocation and schedules a new
/// one `wait` in the future with the latest arguments, so only the last call of
/// a burst runs. A caller that never stops calling starves the function; use
/// [`crate::timing::Throttle`] when periodic execution is required.
///
/// Clones share the same schedule. Calls must be made inside a tokio runtime.
///
/// ```no_run
/// use lesson_intel::timing::Debounce;
/// use std::time::Duration;
///
/// # async fn example() -> lesson_intel::Result<()> {
/// let search = Debounce::new(Duration::from_millis(300), |query: String| query.len())?;
///
/// let _ = search.call("wa".to_string());
/// let settled = search.call("water".to_string());
/// assert_eq!(settled.await?, 5);
/// # Ok(())
/// # }
/// ```
pub struct Debounce<A, R> {
    inner: Arc<DebounceInner<A, R>>,
}

struct DebounceInner<A, R> {
    wait: Duration,
    func: Callback<A, R>,
    state: Mutex<DebounceState<A, R>>,
}

struct DebounceState<A, R> {
    pending_timer: Option<JoinHandle<()>>,
    last_args: Option<A>,
    waiters: Vec<oneshot::Sender<R>>,
    /// Bumped on every reschedule so a superseded timer that already woke up
    /// does not fire
    generation: u64,
}

impl<A, R> Debounce<A, R>
where
    A: Send + 'static,
    R: Clone + Send + 'static,
{
    /// Wrap `func` so that it only runs after `wait` of inactivity
    pub fn new<F>(wait: Duration, func: F) -> Result<Self>
    where
        F: Fn(A) -> R + Send + Sync + 'static,
    {
        if wait.is_zero() {
            return Err(IntelError::InvalidArgument(
                "debounce wait must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            inner: Arc::new(DebounceInner {
                wait,
                func: Box::new(func),
                state: Mutex::new(DebounceState {
                    pending_timer: None,
                    last_args: None,
                    waiters: Vec::new(),
                    generation: 0,
                }),
            }),
        })
    }

    /// Request an invocation with `args`, replacing any pending one
    pub fn call(&self, args: A) -> Settled<R> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.inner.state.lock();

        if let Some(timer) = state.pending_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.last_args = Some(args);
        state.waiters.push(tx);

        let generation = state.generation;
        let deadline = Instant::now() + self.inner.wait;
        let inner = Arc::clone(&self.inner);
        state.pending_timer = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            inner.fire(generation);
        }));

        debug!(
            "Debounced call scheduled in {:?} ({} waiting)",
            self.inner.wait,
            state.waiters.len()
        );
        Settled::new(rx)
    }

    /// Drop the pending invocation, if any
    ///
    /// Waiters of the dropped invocation resolve to [`IntelError::Cancelled`].
    /// Invocations that already started are unaffected.
    pub fn cancel(&self) -> bool {
        let mut state = self.inner.state.lock();

        let had_pending = state.last_args.is_some();
        if let Some(timer) = state.pending_timer.take() {
            timer.abort();
        }
        state.generation += 1;
        state.last_args = None;
        state.waiters.clear();

        if had_pending {
            debug!("Debounced call cancelled");
        }
        had_pending
    }

    /// Run the pending invocation now instead of waiting for the quiet period
    pub fn flush(&self) -> Option<R> {
        let (args, waiters) = {
            let mut state = self.inner.state.lock();
            if let Some(timer) = state.pending_timer.take() {
                timer.abort();
            }
            state.generation += 1;
            (state.last_args.take()?, std::mem::take(&mut state.waiters))
        };

        Some(self.inner.invoke(args, waiters))
    }

    /// Whether an invocation is scheduled
    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().last_args.is_some()
    }
}

impl<A, R> DebounceInner<A, R>
where
    R: Clone,
{
    fn fire(&self, generation: u64) {
        let (args, waiters) = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.pending_timer = None;
            match state.last_args.take() {
                Some(args) => (args, std::mem::take(&mut state.waiters)),
                None => return,
            }
        };

        debug!("Debounced call firing");
        self.invoke(args, waiters);
    }

    fn invoke(&self, args: A, waiters: Vec<oneshot::Sender<R>>) -> R {
        let result = (self.func)(args);
        for waiter in waiters {
            // The caller may have dropped its handle
            let _ = waiter.send(result.clone());
        }
        result
    }
}

impl<A, R> Clone for Debounce<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> fmt::Debug for Debounce<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounce")
            .field("wait", &self.inner.wait)
            .finish()
    }
}
