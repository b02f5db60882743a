//! Mock provider for testing
//!
//! Replays queued outcomes, then falls back to a default reply (or a
//! persistent failure when switched to failing mode).

use super::config::ProviderConfig;
use super::lifecycle::ProviderCore;
use super::status::ProviderStatus;
use super::Provider;
use crate::error::{Error, Result};
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};
use crate::token::{count_tokens, estimate_prompt_tokens};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted result of one `generate` call
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Succeed with this content
    Reply(String),
    /// Fail with a generation error carrying this message
    Fail(String),
    /// Reject as the vendor would with HTTP 429
    RateLimited,
}

/// A provider that returns queued outcomes
pub struct MockProvider {
    core: ProviderCore,
    outcomes: Mutex<VecDeque<MockOutcome>>,
    available: AtomicBool,
    failing: AtomicBool,
    fail_initialize: AtomicBool,
    latency: Duration,
    calls: AtomicUsize,
}

impl MockProvider {
    /// Create a mock with the given configuration
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            core: ProviderCore::new(config),
            outcomes: Mutex::new(VecDeque::new()),
            available: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            fail_initialize: AtomicBool::new(false),
            latency: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Simulate backend latency
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Report the provider as unconfigured
    #[must_use]
    pub fn unavailable(self) -> Self {
        self.available.store(false, Ordering::SeqCst);
        self
    }

    /// Make `initialize` fail
    #[must_use]
    pub fn failing_initialize(self) -> Self {
        self.fail_initialize.store(true, Ordering::SeqCst);
        self
    }

    /// Queue an outcome
    pub fn push_outcome(&self, outcome: MockOutcome) {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(outcome);
    }

    /// Fail every call once the queue is drained
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `generate` or `probe` calls that reached the backend
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.next_outcome() {
            MockOutcome::Reply(content) => {
                let usage =
                    TokenUsage::new(estimate_prompt_tokens(request), count_tokens(&content));
                Ok(GenerationResponse {
                    cost: self.core.cost_for(&usage),
                    model: self.core.config().model.clone(),
                    content,
                    usage,
                    finish_reason: Some("stop".to_string()),
                })
            }
            MockOutcome::Fail(message) => Err(Error::Generation(message)),
            MockOutcome::RateLimited => Err(Error::RateLimit {
                provider: self.core.id().to_string(),
                retry_after_ms: 1000,
            }),
        }
    }

    fn next_outcome(&self) -> MockOutcome {
        let queued = self
            .outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match queued {
            Some(outcome) => outcome,
            None if self.failing.load(Ordering::SeqCst) => {
                MockOutcome::Fail(format!("{} is failing", self.core.id()))
            }
            None => MockOutcome::Reply("mock response".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    fn config(&self) -> &ProviderConfig {
        self.core.config()
    }

    fn status(&self) -> ProviderStatus {
        self.core.status()
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn initialize(&self) -> Result<()> {
        let available = self.is_available();
        let fail = self.fail_initialize.load(Ordering::SeqCst);
        let id = self.core.id().to_string();
        self.core
            .initialize_with(|| async move {
                if !available {
                    return Err(Error::NotConfigured(id));
                }
                if fail {
                    return Err(Error::Initialization {
                        provider: id,
                        message: "mock initialization failure".to_string(),
                    });
                }
                Ok(())
            })
            .await
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.core
            .generate_with(request, || self.respond(request))
            .await
    }

    async fn probe(&self, request: &GenerationRequest) -> Result<GenerationResponse> {
        self.core.probe_with(|| self.respond(request)).await
    }

    async fn destroy(&self) {
        self.core.destroy();
    }
}
