//! Tracing subscriber setup for binaries and tests embedding this crate

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a formatted subscriber filtered by `RUST_LOG`, or `default_directive` when unset
///
/// Returns `false` if a global subscriber was already installed, so calling it
/// more than once is harmless.
pub fn init(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
