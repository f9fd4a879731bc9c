//! Result handle for scheduled calls

use crate::error::{IntelError, Result};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Resolves with the result of the invocation that a scheduled call was folded into
///
/// Every call of one debounced burst (or one throttle window) resolves with the
/// same result. If the pending invocation is cancelled the handle resolves to
/// [`IntelError::Cancelled`]. Dropping the handle does not affect scheduling.
#[derive(Debug)]
pub struct Settled<R> {
    rx: oneshot::Receiver<R>,
}

impl<R> Settled<R> {
    pub(crate) fn new(rx: oneshot::Receiver<R>) -> Self {
        Self { rx }
    }

    /// A handle that is already resolved
    pub(crate) fn ready(value: R) -> Self {
        let (tx, rx) = oneshot::channel();
        // The receiver is alive, so this cannot fail
        let _ = tx.send(value);
        Self { rx }
    }
}

impl<R> Future for Settled<R> {
    type Output = Result<R>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map_err(|_| IntelError::Cancelled("scheduled call was cancelled".to_string()))
    }
}
