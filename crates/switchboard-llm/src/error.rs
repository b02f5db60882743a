//! Error types for switchboard-llm

use crate::provider::ProviderState;
use thiserror::Error;

/// Provider error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider has no credentials or model file
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Provider failed to load its model or open its client
    #[error("initialization failed for {provider}: {message}")]
    Initialization {
        /// Provider id
        provider: String,
        /// What went wrong
        message: String,
    },

    /// Request rejected by the provider's own rate limit
    #[error("rate limit exceeded for {provider} (retry in {retry_after_ms}ms)")]
    RateLimit {
        /// Provider id
        provider: String,
        /// Milliseconds until the next request would be admitted
        retry_after_ms: u64,
    },

    /// Provider is not in a state that accepts requests
    #[error("provider {provider} is not ready (state: {state})")]
    NotReady {
        /// Provider id
        provider: String,
        /// Current lifecycle state
        state: ProviderState,
    },

    /// Backend produced no usable output
    #[error("generation failed: {0}")]
    Generation(String),

    /// API error
    #[error("api error: {0}")]
    Api(String),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),
}

impl Error {
    /// Whether this error should move the provider into the `error` state.
    ///
    /// Rate-limit rejections and readiness checks happen before any work is
    /// dispatched, so they leave the provider untouched.
    #[must_use]
    pub fn marks_provider_failed(&self) -> bool {
        !matches!(
            self,
            Self::RateLimit { .. } | Self::NotReady { .. } | Self::NotConfigured(_)
        )
    }

    /// Whether this is a rate-limit rejection
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimit { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
