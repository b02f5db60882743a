use super::profile::{
    base_profile, CacheStrategy, PerformanceProfile, QUALITY_MAX_TEMPERATURE, QUALITY_MAX_TOKENS,
    SPEED_MAX_TEMPERATURE, SPEED_MAX_TOKENS,
};
use super::system::SystemCapabilities;
use dashmap::DashMap;
use switchboard_llm::{GenerationRequest, RuntimeTuning};
use tracing::{debug, info};

/// Observations above `target × SLOW_FACTOR` shed a thread
const SLOW_FACTOR: f64 = 1.5;

/// Observations below `target × FAST_FACTOR` gain a thread
const FAST_FACTOR: f64 = 0.5;

/// Derives, caches and adjusts per-model performance profiles
#[derive(Debug)]
pub struct PerformanceOptimizer {
    system: SystemCapabilities,
    profiles: DashMap<String, PerformanceProfile>,
}

impl PerformanceOptimizer {
    /// Optimizer for explicit machine capabilities
    #[must_use]
    pub fn new(system: SystemCapabilities) -> Self {
        Self {
            system,
            profiles: DashMap::new(),
        }
    }

    /// Optimizer for the current machine
    #[must_use]
    pub fn detect() -> Self {
        Self::new(SystemCapabilities::detect())
    }

    /// Machine capabilities in use
    #[must_use]
    pub fn system(&self) -> &SystemCapabilities {
        &self.system
    }

    /// Profile for a model, derived and cached on first use
    #[must_use]
    pub fn optimal_profile(&self, model_id: &str) -> PerformanceProfile {
        self.profiles
            .entry(model_id.to_string())
            .or_insert_with(|| {
                let profile = base_profile(model_id).fit_to(&self.system);
                debug!(?profile, "Derived performance profile");
                profile
            })
            .clone()
    }

    /// Cap and tune a request for a model's profile
    #[must_use]
    pub fn optimize_request(&self, request: &GenerationRequest, model_id: &str) -> GenerationRequest {
        let profile = self.optimal_profile(model_id);
        let (max_tokens, max_temperature) = if profile.is_speed_tier() {
            (SPEED_MAX_TOKENS, SPEED_MAX_TEMPERATURE)
        } else {
            (QUALITY_MAX_TOKENS, QUALITY_MAX_TEMPERATURE)
        };

        let mut optimized = request.clone();
        optimized.max_tokens = Some(request.effective_max_tokens().min(max_tokens));
        optimized.temperature = Some(
            request
                .temperature
                .map_or(max_temperature, |t| t.min(max_temperature)),
        );
        optimized.tuning = Some(RuntimeTuning {
            threads: Some(profile.threads),
            batch_size: Some(profile.batch_size),
            cache_prompt: profile.cache_strategy != CacheStrategy::None,
        });
        optimized
    }

    /// Nudge a model's profile toward its target response time
    pub fn adjust_profile(&self, model_id: &str, observed_response_time_ms: u64) {
        // Make sure the entry exists before taking the write guard.
        let _ = self.optimal_profile(model_id);
        let Some(mut profile) = self.profiles.get_mut(model_id) else {
            return;
        };

        let target = profile.target_response_time_ms as f64;
        let observed = observed_response_time_ms as f64;

        if observed > target * SLOW_FACTOR {
            profile.threads = profile.threads.saturating_sub(1).max(1);
            profile.batch_size = 1;
            info!(
                model = model_id,
                observed_ms = observed_response_time_ms,
                threads = profile.threads,
                "Slow response, reducing threads"
            );
        } else if observed < target * FAST_FACTOR && profile.threads < self.system.cpu_cores {
            profile.threads += 1;
            debug!(
                model = model_id,
                observed_ms = observed_response_time_ms,
                threads = profile.threads,
                "Fast response, adding a thread"
            );
        }
    }
}
