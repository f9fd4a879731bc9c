//! Error types for lesson intelligence operations
//!
//! Every variant carries plain string context so the error is `Clone`: a single
//! failed computation is handed to every caller waiting on the same cache key.

use crate::fallback::TierFailure;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug, Clone)]
pub enum IntelError {
    /// Caller bug: an argument outside its valid domain
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration value failed validation or could not be parsed
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No generative client is available (missing API key or failed construction)
    #[error("Generative client not configured: {0}")]
    NotConfigured(String),

    /// The remote provider answered with an error or could not be reached
    #[error("Remote error from {provider}: {message}")]
    RemoteError { provider: String, message: String },

    /// The remote provider throttled the request
    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    /// The remote provider rejected the credentials
    #[error("Invalid API key for {provider}")]
    InvalidApiKey { provider: String },

    /// Operation timeout
    #[error("Operation timed out after {timeout_ms}ms: {context}")]
    TimeoutError { timeout_ms: u64, context: String },

    /// Response could not be turned into usable text
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A tier produced a value that the chain's validator rejected
    #[error("Tier '{tier}' returned a value that failed validation")]
    ValidationFailed { tier: String },

    /// Every tier of a fallback chain failed
    #[error("All {} fallback tiers failed: {}", .failures.len(), describe_failures(.failures))]
    AllTiersFailed { failures: Vec<TierFailure> },

    /// A scheduled call was cancelled before it fired
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

impl IntelError {
    /// Whether this error comes from the environment (network, provider, configuration
    /// at call time) and is therefore absorbed by a fallback chain rather than surfaced.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            IntelError::NotConfigured(_)
                | IntelError::RemoteError { .. }
                | IntelError::RateLimited { .. }
                | IntelError::InvalidApiKey { .. }
                | IntelError::TimeoutError { .. }
                | IntelError::InvalidResponse(_)
                | IntelError::ValidationFailed { .. }
        )
    }
}

fn describe_failures(failures: &[TierFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for lesson intelligence operations
pub type Result<T> = std::result::Result<T, IntelError>;

impl From<String> for IntelError {
    fn from(s: String) -> Self {
        IntelError::Other(s)
    }
}

impl From<&str> for IntelError {
    fn from(s: &str) -> Self {
        IntelError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for IntelError {
    fn from(e: serde_json::Error) -> Self {
        IntelError::SerializationError(e.to_string())
    }
}
