//! Static provider description
//!
//! A `ProviderConfig` is built once at registry-build time and never changes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote API vendors the router can talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// OpenAI chat completions
    OpenAi,
    /// Anthropic messages API
    Anthropic,
    /// Groq (OpenAI-compatible)
    Groq,
}

impl Vendor {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Groq => "groq",
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of backend behind a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// On-device inference: zero marginal cost, bounded by local compute
    LocalInference,
    /// Remote API: per-token cost, bounded by network and vendor limits
    ExternalApi(Vendor),
}

impl BackendKind {
    /// Whether this is an on-device backend
    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::LocalInference)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalInference => f.write_str("local-inference"),
            Self::ExternalApi(vendor) => write!(f, "external-api:{vendor}"),
        }
    }
}

/// What a provider can do and how fast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Streams tokens
    pub supports_streaming: bool,
    /// Supports tool/function calling
    pub supports_function_calling: bool,
    /// Suitable for code generation
    pub supports_code_generation: bool,
    /// Context window in tokens
    pub context_length: u32,
    /// Expected generation throughput
    pub tokens_per_second: f64,
    /// Memory needed to serve the model (0 for remote backends)
    pub memory_requirement_mb: u64,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_streaming: false,
            supports_function_calling: false,
            supports_code_generation: false,
            context_length: 4096,
            tokens_per_second: 20.0,
            memory_requirement_mb: 0,
        }
    }
}

/// Vendor rate limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests per minute (0 = unlimited)
    pub requests_per_minute: u32,
    /// Tokens per minute (0 = unlimited)
    pub tokens_per_minute: u32,
}

impl RateLimit {
    /// Create a rate limit
    #[must_use]
    pub fn new(requests_per_minute: u32, tokens_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            tokens_per_minute,
        }
    }
}

/// Static description of a provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry id (e.g. "openai", "local")
    pub id: String,
    /// Model served by this provider
    pub model: String,
    /// Backend kind
    pub kind: BackendKind,
    /// Capabilities
    pub capabilities: Capabilities,
    /// USD per 1000 tokens (0 for local)
    pub cost_per_1k_tokens: f64,
    /// Vendor rate limit (absent for local)
    pub rate_limit: Option<RateLimit>,
    /// Relative priority, higher wins ties
    pub priority: u8,
}

impl ProviderConfig {
    /// Describe an on-device provider
    #[must_use]
    pub fn local(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            kind: BackendKind::LocalInference,
            capabilities: Capabilities::default(),
            cost_per_1k_tokens: 0.0,
            rate_limit: None,
            priority: 0,
        }
    }

    /// Describe a remote API provider
    #[must_use]
    pub fn external(id: impl Into<String>, vendor: Vendor, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            kind: BackendKind::ExternalApi(vendor),
            capabilities: Capabilities::default(),
            cost_per_1k_tokens: 0.0,
            rate_limit: None,
            priority: 0,
        }
    }

    /// Set capabilities
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set throughput estimate
    #[must_use]
    pub fn with_tokens_per_second(mut self, tokens_per_second: f64) -> Self {
        self.capabilities.tokens_per_second = tokens_per_second;
        self
    }

    /// Set price per 1000 tokens; ignored for local backends
    #[must_use]
    pub fn with_cost_per_1k(mut self, cost: f64) -> Self {
        if !self.kind.is_local() {
            self.cost_per_1k_tokens = cost.max(0.0);
        }
        self
    }

    /// Set rate limit; ignored for local backends
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        if !self.kind.is_local() {
            self.rate_limit = Some(rate_limit);
        }
        self
    }

    /// Set priority
    #[must_use]
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    /// Whether this provider runs on-device
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.kind.is_local()
    }

    /// Cost of a given token count at this provider's price
    #[must_use]
    pub fn cost_for_tokens(&self, tokens: u32) -> f64 {
        if self.is_local() {
            return 0.0;
        }
        f64::from(tokens) / 1000.0 * self.cost_per_1k_tokens
    }
}
