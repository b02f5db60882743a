//! Switchboard LLM - Provider Abstraction
//!
//! This crate provides the backend side of the Switchboard router:
//! - Provider: the `Provider` trait, lifecycle status, rate limiting
//! - Request: generation request/response types and request context
//! - Local: on-device inference through a llama.cpp-compatible runtime
//! - OpenAI: OpenAI-compatible chat APIs (OpenAI, Groq)
//! - Anthropic: Claude Messages API
//! - Mock: scripted provider for tests and dry runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod provider;
pub mod providers;
pub mod request;
pub mod token;
pub mod util;

pub use error::{Error, Result};
pub use provider::{
    BackendKind, Capabilities, MockOutcome, MockProvider, Provider, ProviderConfig, ProviderCore,
    ProviderState, ProviderStatus, RateLimit, RateLimiter, Vendor,
};
pub use request::{
    GenerationRequest, GenerationResponse, GitContext, ProjectContext, RequestContext,
    RuntimeTuning, TokenUsage, DEFAULT_MAX_TOKENS,
};
pub use token::{count_tokens, estimate_prompt_tokens};

// Re-export provider types
pub use providers::anthropic::{AnthropicConfig, AnthropicProvider};
pub use providers::local::{LocalConfig, LocalInferenceProvider};
pub use providers::openai::{OpenAiCompatibleProvider, OpenAiConfig};
