//! Provider - backend abstraction
//!
//! Every backend the router can dispatch to implements [`Provider`]. The set
//! of implementations is closed and chosen when the registry is built; the
//! router never inspects backend type strings.
//!
//! # Module Structure
//!
//! - `config`: static description (capabilities, pricing, rate limit)
//! - `status`: lifecycle state machine
//! - `rate_limit`: synchronous rejecting rate limiter
//! - `lifecycle`: lifecycle bookkeeping embedded in every backend
//! - `mock`: scripted provider for tests

mod config;
mod lifecycle;
mod mock;
mod rate_limit;
mod status;

#[cfg(test)]
mod tests;

pub use config::{BackendKind, Capabilities, ProviderConfig, RateLimit, Vendor};
pub use lifecycle::ProviderCore;
pub use mock::{MockOutcome, MockProvider};
pub use rate_limit::RateLimiter;
pub use status::{ProviderState, ProviderStatus, StatusCell};

use crate::error::Result;
use crate::request::{GenerationRequest, GenerationResponse};
use crate::token::estimate_prompt_tokens;

/// A backend capable of producing a text response to a prompt
///
/// Providers update their own status and `last_used` timestamp but never
/// record usage; accounting belongs to the dispatcher.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Static configuration
    fn config(&self) -> &ProviderConfig;

    /// Registry id
    fn id(&self) -> &str {
        &self.config().id
    }

    /// Status snapshot
    fn status(&self) -> ProviderStatus;

    /// Whether credentials or the model file are present.
    ///
    /// Only existence checks; no network or model loading.
    fn is_available(&self) -> bool;

    /// Load the model or open the client. Idempotent.
    async fn initialize(&self) -> Result<()>;

    /// Generate a response. Only accepted while the provider is routable.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// Send a diagnostic request straight to the backend.
    ///
    /// Skips readiness, rate limiting and status bookkeeping; used by
    /// connectivity tests and benchmarks, never by routing.
    async fn probe(&self, request: &GenerationRequest) -> Result<GenerationResponse>;

    /// Estimated USD cost of a request: prompt plus max tokens at list price
    fn cost_estimate(&self, request: &GenerationRequest) -> f64 {
        let config = self.config();
        if config.is_local() {
            return 0.0;
        }
        let tokens = estimate_prompt_tokens(request).saturating_add(request.effective_max_tokens());
        config.cost_for_tokens(tokens)
    }

    /// Rate limit descriptor
    fn rate_limit(&self) -> Option<RateLimit> {
        self.config().rate_limit
    }

    /// Release resources; status becomes `unloaded`
    async fn destroy(&self);
}
