//! Performance profiles

use super::system::SystemCapabilities;
use crate::models::parameter_count_billions;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Profiles with a target below this are speed tier
pub const SPEED_TIER_TARGET_MS: u64 = 500;

/// Max tokens for speed-tier requests
pub const SPEED_MAX_TOKENS: u32 = 256;

/// Temperature ceiling for speed-tier requests
pub const SPEED_MAX_TEMPERATURE: f32 = 0.3;

/// Max tokens for quality-tier requests
pub const QUALITY_MAX_TOKENS: u32 = 2048;

/// Temperature ceiling for quality-tier requests
pub const QUALITY_MAX_TEMPERATURE: f32 = 0.7;

/// Hard ceiling on inference threads
pub const MAX_THREADS: u32 = 16;

/// Target response time multiplier when a GPU is present
pub const GPU_TARGET_FACTOR: f64 = 0.7;

/// Threads allowed on a memory-constrained machine
const LOW_MEMORY_MAX_THREADS: u32 = 4;

/// Prompt cache policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheStrategy {
    /// No prompt cache
    None,
    /// Keep recently used prompts
    Lru,
    /// Keep everything that fits
    Aggressive,
}

impl fmt::Display for CacheStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Lru => "lru",
            Self::Aggressive => "aggressive",
        })
    }
}

/// Tuned runtime parameters for one model on this machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceProfile {
    /// Model id
    pub model_id: String,
    /// Desired response time
    pub target_response_time_ms: u64,
    /// Memory ceiling
    pub max_memory_mb: u64,
    /// Inference threads
    pub threads: u32,
    /// Prompt batch size
    pub batch_size: u32,
    /// Prompt cache policy
    pub cache_strategy: CacheStrategy,
}

impl PerformanceProfile {
    /// Whether requests should be capped for latency
    #[must_use]
    pub fn is_speed_tier(&self) -> bool {
        self.target_response_time_ms < SPEED_TIER_TARGET_MS
    }

    /// Adapt a base profile to the machine
    #[must_use]
    pub fn fit_to(mut self, system: &SystemCapabilities) -> Self {
        if system.is_low_memory() {
            self.threads = self.threads.min(LOW_MEMORY_MAX_THREADS);
            self.max_memory_mb = self.max_memory_mb.min(system.total_memory_mb / 2);
        } else if system.is_high_end() {
            self.threads = self.threads.max(system.cpu_cores.min(MAX_THREADS));
        }
        self.threads = self.threads.min(system.cpu_cores).clamp(1, MAX_THREADS);

        if system.gpu_available {
            self.target_response_time_ms =
                (self.target_response_time_ms as f64 * GPU_TARGET_FACTOR).round() as u64;
        }
        self
    }
}

/// Static profile for a model before machine adjustment.
///
/// Size classes come from the parameter count in the model id; ids without
/// one get a conservative default.
#[must_use]
pub fn base_profile(model_id: &str) -> PerformanceProfile {
    let (target_response_time_ms, max_memory_mb, threads, batch_size, cache_strategy) =
        match parameter_count_billions(model_id) {
            Some(b) if b <= 4.0 => (450, 4096, 4, 512, CacheStrategy::Aggressive),
            Some(b) if b <= 9.0 => (1500, 8192, 6, 256, CacheStrategy::Lru),
            Some(b) if b <= 20.0 => (3000, 16384, 8, 128, CacheStrategy::Lru),
            Some(_) => (6000, 49152, 8, 64, CacheStrategy::None),
            None => (2000, 8192, 4, 128, CacheStrategy::Lru),
        };

    PerformanceProfile {
        model_id: model_id.to_string(),
        target_response_time_ms,
        max_memory_mb,
        threads,
        batch_size,
        cache_strategy,
    }
}
