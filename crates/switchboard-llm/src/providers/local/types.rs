use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::provider::{Capabilities, ProviderConfig};
use crate::request::RuntimeTuning;

/// Default runtime address
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Default model id reported when none is configured
pub const DEFAULT_MODEL: &str = "llama-3.2-3b-instruct-q4";

/// Local inference configuration
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Registry id
    pub id: String,
    /// Model id (also the optimizer's profile key)
    pub model: String,
    /// Path to the model weights; the provider is available only if it exists
    pub model_path: Option<PathBuf>,
    /// Runtime base URL
    pub base_url: String,
    /// Expected throughput on this machine
    pub tokens_per_second: f64,
    /// Context window
    pub context_length: u32,
    /// Memory the runtime needs for this model
    pub memory_requirement_mb: u64,
    /// Request timeout (longer for local inference)
    pub timeout: Duration,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            id: "local".to_string(),
            model: DEFAULT_MODEL.to_string(),
            model_path: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            tokens_per_second: 30.0,
            context_length: 8192,
            memory_requirement_mb: 4096,
            timeout: Duration::from_secs(120),
        }
    }
}

impl LocalConfig {
    /// Create a configuration for a model file
    #[must_use]
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: Some(model_path.into()),
            ..Default::default()
        }
    }

    /// Create configuration from environment variables
    ///
    /// Reads `SWITCHBOARD_LOCAL_MODEL_PATH`, `SWITCHBOARD_LOCAL_URL` and
    /// `SWITCHBOARD_LOCAL_MODEL`. A missing model path leaves the provider
    /// unavailable rather than failing.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("SWITCHBOARD_LOCAL_MODEL_PATH") {
            if !path.trim().is_empty() {
                config.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(url) = std::env::var("SWITCHBOARD_LOCAL_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("SWITCHBOARD_LOCAL_MODEL") {
            config.model = model;
        }
        config
    }

    /// Set the registry id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the model id
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the runtime URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the throughput estimate
    #[must_use]
    pub fn with_tokens_per_second(mut self, tokens_per_second: f64) -> Self {
        self.tokens_per_second = tokens_per_second;
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Model path, if configured
    #[must_use]
    pub fn model_path(&self) -> Option<&Path> {
        self.model_path.as_deref()
    }

    /// Static provider description
    #[must_use]
    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::local(&self.id, &self.model)
            .with_capabilities(Capabilities {
                supports_streaming: true,
                supports_function_calling: false,
                supports_code_generation: true,
                context_length: self.context_length,
                tokens_per_second: self.tokens_per_second,
                memory_requirement_mb: self.memory_requirement_mb,
            })
            .with_priority(1)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CompletionRequest {
    pub prompt: String,
    pub n_predict: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_threads: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_batch: Option<u32>,
    pub cache_prompt: bool,
    pub stream: bool,
}

impl CompletionRequest {
    pub(crate) fn new(
        prompt: String,
        n_predict: u32,
        temperature: Option<f32>,
        tuning: Option<RuntimeTuning>,
    ) -> Self {
        let tuning = tuning.unwrap_or_default();
        Self {
            prompt,
            n_predict,
            temperature,
            n_threads: tuning.threads,
            n_batch: tuning.batch_size,
            cache_prompt: tuning.cache_prompt,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CompletionResponse {
    pub content: String,
    #[serde(default)]
    pub tokens_predicted: Option<u32>,
    #[serde(default)]
    pub tokens_evaluated: Option<u32>,
    #[serde(default)]
    pub stopped_limit: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    pub message: String,
}
