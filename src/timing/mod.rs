//! Timing primitives for bursty call sites
//!
//! [`Debounce`] runs only the last call of a burst once the burst has gone
//! quiet. [`Throttle`] runs the first call immediately and at most one more per
//! interval. Both hand back a [`Settled`] future that resolves with the result
//! of the invocation the call was folded into.

pub mod debounce;
pub mod settled;
pub mod throttle;

pub use debounce::Debounce;
pub use settled::Settled;
pub use throttle::Throttle;
