use reqwest::Client;
use tracing::{debug, instrument};

use super::types::{ApiError, ChatMessage, ChatRequest, ChatResponse, OpenAiConfig};
use crate::error::{Error, Result};
use crate::provider::{Provider, ProviderConfig, ProviderCore, ProviderStatus};
use crate::providers::{http_error, transport_error};
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};
use crate::token::{count_tokens, estimate_prompt_tokens};

/// Provider for OpenAI-compatible chat completion APIs
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiConfig,
    core: ProviderCore,
}

impl OpenAiCompatibleProvider {
    /// Create a new provider
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;
        let core = ProviderCore::new(config.provider_config());

        Ok(Self {
            client,
            config,
            core,
        })
    }

    /// OpenAI from environment variables
    pub fn openai_from_env() -> Result<Self> {
        Self::new(OpenAiConfig::openai_from_env())
    }

    /// Groq from environment variables
    pub fn groq_from_env() -> Result<Self> {
        Self::new(OpenAiConfig::groq_from_env())
    }

    async fn send_request(&self, api_key: &str, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);
        debug!("Sending request to {}: {}", self.config.vendor, url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !status.is_success() {
            // SECURITY: Don't expose raw HTTP response body
            let detail = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(http_error(self.id(), status, &detail));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    /// One chat completion round trip
    async fn chat(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::NotConfigured(self.id().to_string()))?;

        let chat = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: request.expanded_prompt(),
            }],
            max_tokens: request.effective_max_tokens(),
            temperature: request.temperature,
        };
        let response = self.send_request(api_key, chat).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidResponse("no choices in response".to_string()))?;
        let content = choice.message.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(Error::Generation("empty completion".to_string()));
        }

        let usage = match response.usage {
            Some(usage) => TokenUsage::new(usage.prompt_tokens, usage.completion_tokens),
            None => TokenUsage::new(estimate_prompt_tokens(request), count_tokens(&content)),
        };

        Ok(GenerationResponse {
            cost: self.core.cost_for(&usage),
            content,
            model: response.model,
            usage,
            finish_reason: choice.finish_reason,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatibleProvider {
    fn config(&self) -> &ProviderConfig {
        self.core.config()
    }

    fn status(&self) -> ProviderStatus {
        self.core.status()
    }

    fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn initialize(&self) -> Result<()> {
        let configured = self.is_available();
        let vendor = self.config.vendor;
        self.core
            .initialize_with(|| async move {
                if configured {
                    Ok(())
                } else {
                    Err(Error::NotConfigured(format!("no API key for {vendor}")))
                }
            })
            .await
    }

    #[instrument(skip(self, request), fields(provider = %self.id(), model = %self.config.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.core
            .generate_with(request, || self.chat(request))
            .await
    }

    async fn probe(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.core.probe_with(|| self.chat(request)).await
    }

    async fn destroy(&self) {
        self.core.destroy();
    }
}
