use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::provider::{Capabilities, ProviderConfig, RateLimit, Vendor};
use crate::util::mask_optional_key;

/// OpenAI API base URL
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Groq API base URL
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Default OpenAI model
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default Groq model
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Configuration for an OpenAI-compatible endpoint
#[derive(Clone)]
pub struct OpenAiConfig {
    /// Registry id
    pub id: String,
    /// Vendor behind the endpoint
    pub vendor: Vendor,
    /// API key; the provider is unavailable without one
    pub api_key: Option<String>,
    /// Base URL
    pub base_url: String,
    /// Model
    pub model: String,
    /// USD per 1000 tokens
    pub cost_per_1k_tokens: f64,
    /// Expected throughput
    pub tokens_per_second: f64,
    /// Context window
    pub context_length: u32,
    /// Vendor rate limit
    pub rate_limit: RateLimit,
    /// Request timeout
    pub timeout: Duration,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("id", &self.id)
            .field("vendor", &self.vendor)
            .field("api_key", &mask_optional_key(self.api_key.as_deref()))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("cost_per_1k_tokens", &self.cost_per_1k_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl OpenAiConfig {
    /// OpenAI defaults
    #[must_use]
    pub fn openai(api_key: Option<String>) -> Self {
        Self {
            id: "openai".to_string(),
            vendor: Vendor::OpenAi,
            api_key,
            base_url: OPENAI_BASE_URL.to_string(),
            model: OPENAI_DEFAULT_MODEL.to_string(),
            cost_per_1k_tokens: 0.0006,
            tokens_per_second: 80.0,
            context_length: 128_000,
            rate_limit: RateLimit::new(500, 200_000),
            timeout: Duration::from_secs(60),
        }
    }

    /// Groq defaults
    #[must_use]
    pub fn groq(api_key: Option<String>) -> Self {
        Self {
            id: "groq".to_string(),
            vendor: Vendor::Groq,
            api_key,
            base_url: GROQ_BASE_URL.to_string(),
            model: GROQ_DEFAULT_MODEL.to_string(),
            cost_per_1k_tokens: 0.0007,
            tokens_per_second: 300.0,
            context_length: 128_000,
            rate_limit: RateLimit::new(30, 6_000),
            timeout: Duration::from_secs(30),
        }
    }

    /// OpenAI configuration from `OPENAI_API_KEY` / `OPENAI_BASE_URL` / `OPENAI_MODEL`
    #[must_use]
    pub fn openai_from_env() -> Self {
        Self::openai(read_key("OPENAI_API_KEY")).apply_env("OPENAI_BASE_URL", "OPENAI_MODEL")
    }

    /// Groq configuration from `GROQ_API_KEY` / `GROQ_BASE_URL` / `GROQ_MODEL`
    #[must_use]
    pub fn groq_from_env() -> Self {
        Self::groq(read_key("GROQ_API_KEY")).apply_env("GROQ_BASE_URL", "GROQ_MODEL")
    }

    fn apply_env(mut self, base_url_var: &str, model_var: &str) -> Self {
        if let Ok(url) = std::env::var(base_url_var) {
            self.base_url = url;
        }
        if let Ok(model) = std::env::var(model_var) {
            self.model = model;
        }
        self
    }

    /// Set model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set price per 1000 tokens
    #[must_use]
    pub fn with_cost_per_1k(mut self, cost: f64) -> Self {
        self.cost_per_1k_tokens = cost;
        self
    }

    /// Set rate limit
    #[must_use]
    pub fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Static provider description
    #[must_use]
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::external(&self.id, self.vendor, &self.model)
            .with_capabilities(Capabilities {
                supports_streaming: true,
                supports_function_calling: true,
                supports_code_generation: true,
                context_length: self.context_length,
                tokens_per_second: self.tokens_per_second,
                memory_requirement_mb: 0,
            })
            .with_cost_per_1k(self.cost_per_1k_tokens)
            .with_rate_limit(self.rate_limit)
    }
}

fn read_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|key| !key.trim().is_empty())
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub model: String,
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub message: String,
}
