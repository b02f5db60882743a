//! Anthropic - Claude Messages API provider

/// Provider implementation
pub mod provider;
/// API types and configuration
pub mod types;


pub use provider::AnthropicProvider;
pub use types::{AnthropicConfig, API_VERSION, DEFAULT_MODEL};
