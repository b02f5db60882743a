//! Lifecycle bookkeeping shared by every backend
//!
//! Backends embed a `ProviderCore` and route `initialize`, `generate` and
//! `destroy` through it, so status transitions and rate limiting behave the
//! same for every provider.

use super::config::ProviderConfig;
use super::rate_limit::RateLimiter;
use super::status::{ProviderState, ProviderStatus, StatusCell};
use crate::error::{Error, Result};
use crate::request::{GenerationRequest, GenerationResponse, TokenUsage};
use crate::token::estimate_prompt_tokens;
use std::future::Future;
use tracing::{debug, info};

/// Config, status and rate limiter for one provider
#[derive(Debug)]
pub struct ProviderCore {
    config: ProviderConfig,
    status: StatusCell,
    limiter: RateLimiter,
}

impl ProviderCore {
    /// Create the core for a provider
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        let limiter = RateLimiter::new(config.rate_limit);
        Self {
            config,
            status: StatusCell::new(),
            limiter,
        }
    }

    /// Static configuration
    #[must_use]
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Provider id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Status snapshot
    #[must_use]
    pub fn status(&self) -> ProviderStatus {
        self.status.snapshot()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ProviderState {
        self.status.state()
    }

    /// Run `load` unless the provider is already ready.
    ///
    /// Calling this on a ready (or busy) provider is a no-op.
    pub async fn initialize_with<F, Fut>(&self, load: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        match self.state() {
            ProviderState::Ready | ProviderState::Busy | ProviderState::Loading => return Ok(()),
            ProviderState::Unloaded | ProviderState::Error => {}
        }

        self.status.transition(self.id(), ProviderState::Loading);
        match load().await {
            Ok(()) => {
                self.status.transition(self.id(), ProviderState::Ready);
                info!(provider = %self.id(), model = %self.config.model, "Provider ready");
                Ok(())
            }
            Err(e) => {
                let err = match e {
                    Error::Initialization { .. } => e,
                    other => Error::Initialization {
                        provider: self.id().to_string(),
                        message: other.to_string(),
                    },
                };
                self.status.fail(self.id(), err.to_string());
                Err(err)
            }
        }
    }

    /// Run one generation call with readiness, rate-limit and status handling
    pub async fn generate_with<F, Fut>(
        &self,
        request: &GenerationRequest,
        call: F,
    ) -> Result<GenerationResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<GenerationResponse>>,
    {
        let state = self.state();
        if !state.is_routable() {
            return Err(Error::NotReady {
                provider: self.id().to_string(),
                state,
            });
        }

        let estimated_tokens =
            estimate_prompt_tokens(request).saturating_add(request.effective_max_tokens());
        self.status.begin_request(self.id(), || {
            self.limiter.check(self.id(), estimated_tokens)
        })?;

        debug!(provider = %self.id(), estimated_tokens, "Dispatching generation");
        let result = call().await;
        self.status.finish_request(self.id(), &result);
        result
    }

    /// Run one diagnostic call outside the request lifecycle.
    ///
    /// Neither the rate limiter nor the status cell sees it, so a failed or
    /// throttled probe leaves routing exactly as it was.
    pub async fn probe_with<F, Fut>(&self, call: F) -> Result<GenerationResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<GenerationResponse>>,
    {
        debug!(provider = %self.id(), state = %self.state(), "Probing provider");
        call().await
    }

    /// Release resources: `ready|error → unloaded`
    pub fn destroy(&self) {
        match self.state() {
            ProviderState::Unloaded => {}
            _ => {
                if self.status.transition(self.id(), ProviderState::Unloaded) {
                    info!(provider = %self.id(), "Provider unloaded");
                }
            }
        }
    }

    /// Cost of actual usage at this provider's price
    #[must_use]
    pub fn cost_for(&self, usage: &TokenUsage) -> f64 {
        self.config.cost_for_tokens(usage.total_tokens)
    }
}
