//! Error types for switchboard-core

use thiserror::Error;

/// Router error type
#[derive(Debug, Error)]
pub enum Error {
    /// No ready provider survived selection
    #[error("no providers available: {0}")]
    NoProvidersAvailable(String),

    /// Provider error surfaced to the caller
    #[error(transparent)]
    Provider(#[from] switchboard_llm::Error),

    /// Usage state could not be read or written
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Invalid settings
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error came from a provider rate limit
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_rate_limit())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
