//! Additive integer scoring

use crate::criteria::{SelectionCriteria, SelectionReason};
use crate::models::model_tier;
use crate::usage::UsageMetrics;
use switchboard_llm::ProviderConfig;

/// Fixed network latency charged to remote providers
pub const NETWORK_LATENCY_MS: f64 = 200.0;

/// Fixed processing overhead charged to every provider
pub const PROCESSING_OVERHEAD_MS: f64 = 100.0;

/// Standing bonus for on-device providers
pub const LOCALITY_BONUS: i32 = 15;

/// Estimated response time for `max_tokens` on a provider
#[must_use]
pub fn estimate_response_time_ms(config: &ProviderConfig, max_tokens: u32) -> u64 {
    let tokens_per_second = if config.capabilities.tokens_per_second > 0.0 {
        config.capabilities.tokens_per_second
    } else {
        1.0
    };
    let generation = f64::from(max_tokens) / tokens_per_second * 1000.0;
    let network = if config.is_local() { 0.0 } else { NETWORK_LATENCY_MS };
    (generation + network + PROCESSING_OVERHEAD_MS).round() as u64
}

/// Points per scoring component
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    /// Capability bonus
    pub capability: i32,
    /// Speed tier points
    pub speed: i32,
    /// Cost tier points
    pub cost: i32,
    /// Model quality points
    pub quality: i32,
    /// Historical reliability
    pub reliability: i32,
    /// Local bonus
    pub locality: i32,
}

impl ScoreBreakdown {
    /// Score one candidate
    #[must_use]
    pub fn compute(
        config: &ProviderConfig,
        criteria: &SelectionCriteria,
        estimated_cost: f64,
        estimated_time_ms: u64,
        history: Option<&UsageMetrics>,
    ) -> Self {
        let caps = &config.capabilities;
        let mut score = Self::default();

        if caps.supports_code_generation {
            score.capability += 20;
        }
        if caps.supports_function_calling {
            score.capability += 15;
        }
        if caps.supports_streaming {
            score.capability += 10;
        }

        if criteria.prioritize_speed {
            score.speed = match estimated_time_ms {
                t if t < 500 => 50,
                t if t < 2000 => 30,
                t if t < 5000 => 10,
                _ => 0,
            };
        }

        if criteria.prioritize_cost {
            score.cost = match estimated_cost {
                c if c == 0.0 => 40,
                c if c < 0.001 => 30,
                c if c < 0.01 => 20,
                c if c < 0.1 => 10,
                _ => 0,
            };
        }

        if criteria.prioritize_quality {
            score.quality = model_tier(&config.model).quality_points();
        }

        if let Some(metrics) = history.filter(|m| m.has_history()) {
            let error_rate = metrics.error_rate.clamp(0.0, 1.0);
            score.reliability = (20.0 * (1.0 - error_rate)).round() as i32;
            if metrics.successful_requests() > 0 && metrics.average_response_time_ms < 1000.0 {
                score.reliability += 10;
            }
        }

        if config.is_local() {
            score.locality = LOCALITY_BONUS;
        }

        score
    }

    /// Sum of all components
    #[must_use]
    pub fn total(&self) -> i32 {
        self.capability + self.speed + self.cost + self.quality + self.reliability + self.locality
    }

    /// The criterion that contributed most to this score.
    ///
    /// `LocalRequired` only ever labels an on-device candidate; remote ones
    /// restored by fallback are scored like any other.
    #[must_use]
    pub fn dominant_reason(&self, criteria: &SelectionCriteria) -> SelectionReason {
        if criteria.require_local && self.locality > 0 {
            return SelectionReason::LocalRequired;
        }
        // Ties resolve in speed, cost, quality order.
        let components = [
            (self.speed, SelectionReason::Speed),
            (self.cost, SelectionReason::Cost),
            (self.quality, SelectionReason::Quality),
        ];
        let mut best = (0, SelectionReason::Availability);
        for (points, reason) in components {
            if points > best.0 {
                best = (points, reason);
            }
        }
        best.1
    }
}
