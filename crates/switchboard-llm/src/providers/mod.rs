//! Concrete provider backends
//!
//! - `local`: on-device inference through a llama.cpp-compatible server
//! - `openai`: OpenAI-compatible chat completions (OpenAI, Groq)
//! - `anthropic`: Claude Messages API

pub mod anthropic;
pub mod local;
pub mod openai;

use crate::error::Error;
use crate::util::sanitize_api_error;

/// Map a non-success HTTP status to a provider error
pub(crate) fn http_error(provider: &str, status: reqwest::StatusCode, detail: &str) -> Error {
    if status.as_u16() == 429 {
        return Error::RateLimit {
            provider: provider.to_string(),
            retry_after_ms: 0,
        };
    }
    Error::Api(sanitize_api_error(&format!("HTTP {status}: {detail}")))
}

/// Map a reqwest transport error
pub(crate) fn transport_error(error: reqwest::Error, timeout: std::time::Duration) -> Error {
    if error.is_timeout() {
        Error::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
    } else {
        Error::Network(sanitize_api_error(&error.to_string()))
    }
}
