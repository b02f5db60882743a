//! Dispatcher - request routing with one-shot fallback
//!
//! Each request moves through
//!
//! ```text
//! selecting ─▶ executing ─┬─▶ succeeded
//!                         └─▶ failed ─▶ executing(alternative) ─┬─▶ succeeded
//!                                                               └─▶ exhausted
//! ```
//!
//! Every attempt, successful or not, is recorded with the usage tracker.
//! When both attempts fail the caller sees the primary's error.

mod diagnostics;
mod types;


pub use diagnostics::{BENCHMARK_PROMPTS, TEST_PROMPT};
pub use types::{
    BenchmarkResult, ProviderReport, ProviderTestResult, ResponseMetadata, RoutedResponse,
    TestOutcome,
};

use crate::config::RouterSettings;
use crate::criteria::{CriteriaOverrides, SelectionCriteria, SelectionReason, SelectionResult};
use crate::error::{Error, Result};
use crate::events::{EventBus, RouterEvent};
use crate::optimizer::PerformanceOptimizer;
use crate::registry::build_providers;
use crate::selector::ProviderSelector;
use crate::usage::{Budget, BudgetStatus, RequestOutcome, UsagePeriod, UsageReport, UsageTracker};
use chrono::Utc;
use futures::future::join_all;
use std::sync::Arc;
use std::time::{Duration, Instant};
use switchboard_llm::{GenerationRequest, GenerationResponse, Provider, ProviderState};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// A successful attempt
struct Attempt {
    response: GenerationResponse,
    response_time_ms: u64,
}

/// Routes requests across the provider registry
pub struct Dispatcher {
    providers: Vec<Arc<dyn Provider>>,
    tracker: Arc<UsageTracker>,
    selector: ProviderSelector,
    optimizer: PerformanceOptimizer,
    events: EventBus,
    criteria: SelectionCriteria,
    error_cooldown: Option<Duration>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.providers.iter().map(|p| p.id()).collect();
        f.debug_struct("Dispatcher")
            .field("providers", &ids)
            .field("criteria", &self.criteria)
            .field("error_cooldown", &self.error_cooldown)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Create a dispatcher over a fixed registry.
    ///
    /// Registry order is the final tie-breaker during selection.
    #[must_use]
    pub fn new(
        providers: Vec<Arc<dyn Provider>>,
        tracker: Arc<UsageTracker>,
        events: EventBus,
    ) -> Self {
        Self {
            providers,
            tracker,
            selector: ProviderSelector::new(),
            optimizer: PerformanceOptimizer::detect(),
            events,
            criteria: SelectionCriteria::default(),
            error_cooldown: Some(Duration::from_secs(60)),
        }
    }

    /// Build the registry, tracker and event bus from settings
    pub async fn from_settings(settings: &RouterSettings) -> Result<Self> {
        settings.validate()?;

        let events = EventBus::new(settings.event_capacity);
        let tracker = match settings.usage.resolved_state_path() {
            Some(path) => UsageTracker::open(path, events.clone()).await,
            None => UsageTracker::new(events.clone()),
        };
        for (provider_id, budget) in &settings.budgets {
            if tracker.budget(provider_id).is_none() {
                tracker.set_budget(provider_id.clone(), *budget);
            }
        }

        let providers = build_providers(&settings.providers);
        Ok(Self::new(providers, Arc::new(tracker), events)
            .with_criteria(settings.criteria.clone())
            .with_error_cooldown(settings.error_cooldown()))
    }

    /// Set the default selection criteria
    #[must_use]
    pub fn with_criteria(mut self, criteria: SelectionCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    /// Use a specific optimizer instead of probing this machine
    #[must_use]
    pub fn with_optimizer(mut self, optimizer: PerformanceOptimizer) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Re-initialize errored providers after this long; `None` disables it
    #[must_use]
    pub fn with_error_cooldown(mut self, cooldown: Option<Duration>) -> Self {
        self.error_cooldown = cooldown;
        self
    }

    /// Registered providers in registry order
    #[must_use]
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Look up a provider by id
    #[must_use]
    pub fn provider(&self, id: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    /// Shared usage tracker
    #[must_use]
    pub fn tracker(&self) -> &Arc<UsageTracker> {
        &self.tracker
    }

    /// Default selection criteria
    #[must_use]
    pub fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }

    /// Performance optimizer for local providers
    #[must_use]
    pub fn optimizer(&self) -> &PerformanceOptimizer {
        &self.optimizer
    }

    /// Subscribe to router events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RouterEvent> {
        self.events.subscribe()
    }

    /// Initialize every available provider concurrently.
    ///
    /// Returns the ids of providers that ended up routable. Individual
    /// failures are logged and leave that provider in `error`.
    pub async fn initialize(&self) -> Vec<String> {
        let attempts = self.providers.iter().map(|provider| async move {
            if !provider.is_available() {
                debug!(provider = provider.id(), "Provider unavailable, skipping initialization");
                return;
            }
            if let Err(e) = provider.initialize().await {
                warn!(provider = provider.id(), error = %e, "Provider failed to initialize");
            }
        });
        join_all(attempts).await;

        let providers: Vec<String> = self.providers.iter().map(|p| p.id().to_string()).collect();
        let ready: Vec<String> = self
            .providers
            .iter()
            .filter(|p| p.status().state.is_routable())
            .map(|p| p.id().to_string())
            .collect();

        info!(
            registered = providers.len(),
            ready = ready.len(),
            "Router initialized"
        );
        self.events.publish(RouterEvent::Initialized {
            providers,
            ready: ready.clone(),
        });
        ready
    }

    /// Route a request and produce a response
    #[instrument(skip(self, request, overrides), fields(request_id = tracing::field::Empty))]
    pub async fn generate_response(
        &self,
        request: &GenerationRequest,
        overrides: &CriteriaOverrides,
    ) -> Result<RoutedResponse> {
        let request_id = Uuid::new_v4();
        tracing::Span::current().record("request_id", tracing::field::display(request_id));

        let criteria = self.criteria.merge(overrides);
        self.revive_errored().await;

        let selection =
            self.selector
                .select(request, &criteria, &self.providers, &self.tracker.metrics_map())?;
        let primary = self.provider(&selection.provider_id).ok_or_else(|| {
            Error::NoProvidersAvailable(format!("{} is not registered", selection.provider_id))
        })?;

        let primary_error = match self.execute(primary, request).await {
            Ok(attempt) => {
                return Ok(self.complete(request_id, request, &selection, attempt, false));
            }
            Err(e) => e,
        };

        let alternative = selection
            .alternatives
            .first()
            .and_then(|alt| self.provider(&alt.provider_id));
        let Some(alternative) = alternative.filter(|_| criteria.allow_fallback) else {
            return Err(primary_error.into());
        };

        info!(
            from = %selection.provider_id,
            to = alternative.id(),
            error = %primary_error,
            "Primary provider failed, trying alternative"
        );
        self.events.publish(RouterEvent::ProviderSwitched {
            request_id,
            from: selection.provider_id.clone(),
            to: alternative.id().to_string(),
            error: primary_error.to_string(),
        });

        match self.execute(alternative, request).await {
            Ok(attempt) => {
                let fallback = SelectionResult {
                    provider_id: alternative.id().to_string(),
                    reason: SelectionReason::Fallback,
                    ..selection
                };
                Ok(self.complete(request_id, request, &fallback, attempt, true))
            }
            Err(fallback_error) => {
                warn!(
                    provider = alternative.id(),
                    error = %fallback_error,
                    "Fallback provider failed as well"
                );
                Err(primary_error.into())
            }
        }
    }

    /// Run one attempt and record it with the tracker
    async fn execute(
        &self,
        provider: &Arc<dyn Provider>,
        request: &GenerationRequest,
    ) -> std::result::Result<Attempt, switchboard_llm::Error> {
        let config = provider.config();
        let tuned;
        let request = if config.is_local() {
            tuned = self.optimizer.optimize_request(request, &config.model);
            &tuned
        } else {
            request
        };

        let started = Instant::now();
        let result = provider.generate(request).await;
        let response_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let command = request.command_key();
        match result {
            Ok(response) => {
                self.tracker
                    .track_request(RequestOutcome::success(
                        provider.id(),
                        command,
                        response.usage.total_tokens,
                        response.cost,
                        response_time_ms,
                    ))
                    .await;
                if config.is_local() {
                    self.optimizer.adjust_profile(&config.model, response_time_ms);
                }
                Ok(Attempt {
                    response,
                    response_time_ms,
                })
            }
            Err(e) => {
                warn!(provider = provider.id(), error = %e, response_time_ms, "Attempt failed");
                self.tracker
                    .track_request(RequestOutcome::failure(provider.id(), command, response_time_ms))
                    .await;
                Err(e)
            }
        }
    }

    fn complete(
        &self,
        request_id: Uuid,
        request: &GenerationRequest,
        selection: &SelectionResult,
        attempt: Attempt,
        fallback_used: bool,
    ) -> RoutedResponse {
        let metadata = ResponseMetadata {
            request_id,
            provider_id: selection.provider_id.clone(),
            response_time_ms: attempt.response_time_ms,
            context_used: request.has_context(),
            expanded_prompt: request.expanded_prompt(),
            fallback_used,
            selection_reason: selection.reason,
        };

        info!(
            provider = %metadata.provider_id,
            reason = %metadata.selection_reason,
            response_time_ms = metadata.response_time_ms,
            tokens = attempt.response.usage.total_tokens,
            cost = attempt.response.cost,
            fallback_used,
            "Response generated"
        );
        self.events.publish(RouterEvent::ResponseGenerated {
            request_id,
            provider_id: metadata.provider_id.clone(),
            reason: metadata.selection_reason,
            response_time_ms: metadata.response_time_ms,
            tokens: attempt.response.usage.total_tokens,
            cost: attempt.response.cost,
            fallback_used,
        });

        RoutedResponse {
            response: attempt.response,
            metadata,
        }
    }

    /// Give errored providers another chance once their cooldown has passed
    async fn revive_errored(&self) {
        let Some(cooldown) = self.error_cooldown else {
            return;
        };
        let now = Utc::now();

        let due = self.providers.iter().filter(|provider| {
            let status = provider.status();
            status.state == ProviderState::Error
                && provider.is_available()
                && status
                    .last_error_at
                    .is_none_or(|at| {
                        now.signed_duration_since(at)
                            .to_std()
                            .is_ok_and(|elapsed| elapsed >= cooldown)
                    })
        });

        let attempts = due.map(|provider| async move {
            info!(provider = provider.id(), "Re-initializing provider after error");
            if let Err(e) = provider.initialize().await {
                debug!(provider = provider.id(), error = %e, "Provider still failing");
            }
        });
        join_all(attempts).await;
    }

    /// Per-provider status snapshot
    #[must_use]
    pub fn status(&self) -> Vec<ProviderReport> {
        self.providers
            .iter()
            .map(|provider| ProviderReport {
                provider_id: provider.id().to_string(),
                model: provider.config().model.clone(),
                backend: provider.config().kind.to_string(),
                available: provider.is_available(),
                status: provider.status(),
                metrics: self.tracker.metrics(provider.id()),
                budget: self.tracker.budget_status(provider.id()),
            })
            .collect()
    }

    /// Aggregate usage for a period
    #[must_use]
    pub fn usage_report(&self, period: UsagePeriod) -> UsageReport {
        self.tracker.generate_report(period)
    }

    /// Spend against each budget window for a provider
    #[must_use]
    pub fn budget_status(&self, provider_id: &str) -> BudgetStatus {
        self.tracker.budget_status(provider_id)
    }

    /// Set (or clear, with an empty budget) a provider's budget and persist it
    pub async fn set_budget(&self, provider_id: &str, budget: Budget) {
        self.tracker.set_budget(provider_id, budget);
        self.tracker.persist().await;
    }

    /// Persist usage state and release every provider
    pub async fn shutdown(&self) {
        self.tracker.persist().await;
        join_all(self.providers.iter().map(|p| p.destroy())).await;
        info!("Router shut down");
    }
}
