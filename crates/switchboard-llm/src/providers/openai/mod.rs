//! OpenAI-compatible chat completions provider
//!
//! Serves OpenAI itself and Groq, which exposes the same
//! `/chat/completions` surface under a different base URL.

/// Provider implementation
pub mod provider;
/// API types and configuration
pub mod types;

#[cfg(test)]
mod tests;

pub use provider::OpenAiCompatibleProvider;
pub use types::{OpenAiConfig, GROQ_BASE_URL, GROQ_DEFAULT_MODEL, OPENAI_BASE_URL, OPENAI_DEFAULT_MODEL};
