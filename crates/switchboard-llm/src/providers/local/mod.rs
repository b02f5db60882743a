//! Local - on-device inference provider
//!
//! Talks to a llama.cpp-compatible server running on this machine. The
//! router never loads weights itself; it only checks that the model file
//! exists and that the runtime answers its health probe.

/// Provider implementation
pub mod provider;
/// API types and configuration
pub mod types;


pub use provider::LocalInferenceProvider;
pub use types::{LocalConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
