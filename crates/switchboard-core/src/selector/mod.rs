//! Provider selection
//!
//! Ranks routable providers for a request:
//!
//! 1. An explicitly requested provider that is routable wins outright.
//! 2. `require_local` keeps only on-device providers and
//!    `max_cost_per_request` drops expensive ones. If that empties the set
//!    and fallback is allowed, the unfiltered set comes back.
//! 3. Every candidate gets an additive integer score (see [`ScoreBreakdown`]).
//! 4. The best score is the selection; up to three runners-up become
//!    alternatives.
//!
//! The selector holds no state. It reads provider status and usage history
//! and never mutates either.

mod scoring;

#[cfg(test)]
mod tests;

pub use scoring::{
    estimate_response_time_ms, ScoreBreakdown, LOCALITY_BONUS, NETWORK_LATENCY_MS,
    PROCESSING_OVERHEAD_MS,
};

use crate::criteria::{Alternative, SelectionCriteria, SelectionReason, SelectionResult};
use crate::error::{Error, Result};
use crate::usage::UsageMetrics;
use std::collections::HashMap;
use std::sync::Arc;
use switchboard_llm::{GenerationRequest, Provider};
use tracing::{debug, info};

/// Alternatives kept in a selection result
pub const MAX_ALTERNATIVES: usize = 3;

#[derive(Debug)]
struct Candidate<'a> {
    index: usize,
    id: &'a str,
    priority: u8,
    estimated_cost: f64,
    estimated_time_ms: u64,
    score: ScoreBreakdown,
}

/// Stateless multi-criteria provider selector
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderSelector;

impl ProviderSelector {
    /// Create a selector
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Pick a provider for `request`.
    ///
    /// `providers` is the whole registry in registry order; only routable
    /// providers are considered.
    pub fn select(
        &self,
        request: &GenerationRequest,
        criteria: &SelectionCriteria,
        providers: &[Arc<dyn Provider>],
        history: &HashMap<String, UsageMetrics>,
    ) -> Result<SelectionResult> {
        let ready: Vec<(usize, &Arc<dyn Provider>)> = providers
            .iter()
            .enumerate()
            .filter(|(_, p)| p.status().state.is_routable())
            .collect();

        if ready.is_empty() {
            return Err(Error::NoProvidersAvailable(
                "no provider is ready".to_string(),
            ));
        }

        let max_tokens = request.effective_max_tokens();

        if let Some(preferred) = request.preferred_provider.as_deref() {
            if let Some((_, provider)) = ready.iter().find(|(_, p)| p.id() == preferred) {
                info!(provider = preferred, "Using requested provider");
                return Ok(SelectionResult {
                    provider_id: preferred.to_string(),
                    reason: SelectionReason::UserSpecified,
                    estimated_cost: provider.cost_estimate(request),
                    estimated_response_time_ms: estimate_response_time_ms(
                        provider.config(),
                        max_tokens,
                    ),
                    alternatives: Vec::new(),
                });
            }
            debug!(provider = preferred, "Requested provider is not ready, selecting normally");
        }

        let filtered: Vec<(usize, &Arc<dyn Provider>)> = ready
            .iter()
            .copied()
            .filter(|(_, p)| !criteria.require_local || p.config().is_local())
            .filter(|(_, p)| match criteria.max_cost_per_request {
                Some(max) => p.cost_estimate(request) <= max,
                None => true,
            })
            .collect();

        let (pool, restored) = if !filtered.is_empty() {
            (filtered, false)
        } else if criteria.allow_fallback {
            debug!("Filtering removed every provider, restoring the ready set");
            (ready, true)
        } else {
            return Err(Error::NoProvidersAvailable(
                "no provider satisfies the selection criteria".to_string(),
            ));
        };

        let mut candidates: Vec<Candidate<'_>> = pool
            .iter()
            .map(|(index, provider)| {
                let config = provider.config();
                let estimated_cost = provider.cost_estimate(request);
                let estimated_time_ms = estimate_response_time_ms(config, max_tokens);
                let score = ScoreBreakdown::compute(
                    config,
                    criteria,
                    estimated_cost,
                    estimated_time_ms,
                    history.get(provider.id()),
                );
                debug!(
                    provider = provider.id(),
                    score = score.total(),
                    ?score,
                    estimated_cost,
                    estimated_time_ms,
                    "Scored provider"
                );
                Candidate {
                    index: *index,
                    id: provider.id(),
                    priority: config.priority,
                    estimated_cost,
                    estimated_time_ms,
                    score,
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.score
                .total()
                .cmp(&a.score.total())
                .then_with(|| b.priority.cmp(&a.priority))
                .then_with(|| a.index.cmp(&b.index))
        });

        let mut ranked = candidates.into_iter();
        let Some(best) = ranked.next() else {
            return Err(Error::NoProvidersAvailable(
                "no candidate providers".to_string(),
            ));
        };

        let reason = if restored {
            SelectionReason::Fallback
        } else {
            best.score.dominant_reason(criteria)
        };

        if let Some(limit) = criteria.max_response_time_ms {
            if best.estimated_time_ms > limit {
                debug!(
                    provider = best.id,
                    estimated_time_ms = best.estimated_time_ms,
                    limit,
                    "Selected provider is expected to exceed the response time target"
                );
            }
        }

        let alternatives: Vec<Alternative> = ranked
            .take(MAX_ALTERNATIVES)
            .map(|c| Alternative {
                provider_id: c.id.to_string(),
                reason: c.score.dominant_reason(criteria),
                estimated_cost: c.estimated_cost,
                estimated_response_time_ms: c.estimated_time_ms,
            })
            .collect();

        info!(
            provider = best.id,
            %reason,
            score = best.score.total(),
            alternatives = alternatives.len(),
            "Selected provider"
        );

        Ok(SelectionResult {
            provider_id: best.id.to_string(),
            reason,
            estimated_cost: best.estimated_cost,
            estimated_response_time_ms: best.estimated_time_ms,
            alternatives,
        })
    }
}
