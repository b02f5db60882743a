use reqwest::Client;
use tracing::{debug, instrument};

use super::types::{CompletionRequest, CompletionResponse, ErrorResponse, LocalConfig};
use crate::error::{Error, Result};
use crate::provider::{Provider, ProviderConfig, ProviderCore, ProviderStatus};
use crate::providers::{http_error, transport_error};
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};
use crate::token::{count_tokens, estimate_prompt_tokens};

/// On-device inference provider
pub struct LocalInferenceProvider {
    client: Client,
    config: LocalConfig,
    core: ProviderCore,
}

impl LocalInferenceProvider {
    /// Create a new local provider
    pub fn new(config: LocalConfig) -> Result<Self> {
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
        Self::new(LocalConfig::from_env())
    }

    /// Backend configuration
    #[must_use]
    pub fn local_config(&self) -> &LocalConfig {
        &self.config
    }

    fn model_file_exists(&self) -> bool {
        self.config.model_path().is_some_and(|path| path.is_file())
    }

    async fn probe_runtime(&self) -> Result<()> {
        let url = format!("{}/health", self.config.base_url);
        debug!("Probing local runtime: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(http_error(self.id(), status, "runtime health check failed"));
        }
        Ok(())
    }

    async fn send_request(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let url = format!("{}/completion", self.config.base_url);

        let response = self
            .client
            .post(&url)
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
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(http_error(self.id(), status, &detail));
        }

        serde_json::from_str(&body).map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    /// One completion against the local runtime
    async fn complete(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        let completion = CompletionRequest::new(
            request.expanded_prompt(),
            request.effective_max_tokens(),
            request.temperature,
            request.tuning,
        );
        let response = self.send_request(completion).await?;

        if response.content.trim().is_empty() {
            return Err(Error::Generation("local runtime returned no text".to_string()));
        }

        let prompt_tokens = response
            .tokens_evaluated
            .unwrap_or_else(|| estimate_prompt_tokens(request));
        let completion_tokens = response
            .tokens_predicted
            .unwrap_or_else(|| count_tokens(&response.content));
        let finish_reason = if response.stopped_limit { "length" } else { "stop" };

        Ok(GenerationResponse {
            content: response.content,
            model: self.config.model.clone(),
            usage: TokenUsage::new(prompt_tokens, completion_tokens),
            cost: 0.0,
            finish_reason: Some(finish_reason.to_string()),
        })
    }
}

#[async_trait::async_trait]
impl Provider for LocalInferenceProvider {
    fn config(&self) -> &ProviderConfig {
        self.core.config()
    }

    fn status(&self) -> ProviderStatus {
        self.core.status()
    }

    fn is_available(&self) -> bool {
        self.model_file_exists()
    }

    async fn initialize(&self) -> Result<()> {
        self.core
            .initialize_with(|| async {
                match self.config.model_path() {
                    Some(path) if path.is_file() => {}
                    Some(path) => {
                        return Err(Error::NotConfigured(format!(
                            "model file not found: {}",
                            path.display()
                        )))
                    }
                    None => {
                        return Err(Error::NotConfigured(
                            "SWITCHBOARD_LOCAL_MODEL_PATH not set".to_string(),
                        ))
                    }
                }
                self.probe_runtime().await
            })
            .await
    }

    #[instrument(skip(self, request), fields(provider = %self.id(), model = %self.config.model))]
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.core
            .generate_with(request, || self.complete(request))
            .await
    }

    async fn probe(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.core.probe_with(|| self.complete(request)).await
    }

    async fn destroy(&self) {
        self.core.destroy();
    }
}
