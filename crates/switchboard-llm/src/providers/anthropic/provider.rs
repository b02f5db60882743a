use reqwest::Client;
use tracing::{debug, instrument};

use super::types::{
    AnthropicConfig, AnthropicError, ContentBlock, Message, MessagesRequest, MessagesResponse,
    API_VERSION,
};
use crate::error::{Error, Result};
use crate::provider::{Provider, ProviderConfig, ProviderCore, ProviderStatus};
use crate::providers::{http_error, transport_error};
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    config: AnthropicConfig,
    core: ProviderCore,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider
    pub fn new(config: AnthropicConfig) -> Result<Self> {
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

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(AnthropicConfig::from_env())
    }

    async fn send_request(&self, api_key: &str, request: MessagesRequest) -> Result<MessagesResponse> {
        let url = format!("{}/v1/messages", self.config.base_url);
        debug!("Sending request to Anthropic: {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
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
            let detail = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| format!("{}: {}", e.error.kind, e.error.message))
                .unwrap_or(body);
            return Err(http_error(self.id(), status, &detail));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    /// One messages API round trip
    async fn messages(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| Error::NotConfigured(self.id().to_string()))?;

        let messages = MessagesRequest {
            model: self.config.model.clone(),
            max_tokens: request.effective_max_tokens(),
            messages: vec![Message {
                role: "user",
                content: request.expanded_prompt(),
            }],
            temperature: request.temperature,
        };
        let response = self.send_request(api_key, messages).await?;

        let content = response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        if content.trim().is_empty() {
            return Err(Error::Generation("empty completion".to_string()));
        }

        let usage = TokenUsage::new(response.usage.input_tokens, response.usage.output_tokens);
        Ok(GenerationResponse {
            cost: self.core.cost_for(&usage),
            content,
            model: response.model,
            usage,
            finish_reason: response.stop_reason,
        })
    }
}

#[async_trait::async_trait]
impl Provider for AnthropicProvider {
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
        self.core
            .initialize_with(|| async move {
                if configured {
                    Ok(())
                } else {
                    Err(Error::NotConfigured("ANTHROPIC_API_KEY not set".to_string()))
                }
            })
            .await
    }

    #[instrument(skip(self, request), fields(provider = %self.id(), model = %self.config.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.core
            .generate_with(request, || self.messages(request))
            .await
    }

    async fn probe(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.core.probe_with(|| self.messages(request)).await
    }

    async fn destroy(&self) {
        self.core.destroy();
    }
}
