//! Runtime tuning for on-device providers
//!
//! A [`PerformanceProfile`] per model is derived once from the model's size
//! class and this machine's capabilities, cached, and then nudged by observed
//! latency. Requests routed to local providers are capped and tuned from it.

mod profile;
mod system;
mod tuner;


pub use profile::{
    base_profile, CacheStrategy, PerformanceProfile, GPU_TARGET_FACTOR, MAX_THREADS,
    QUALITY_MAX_TOKENS, QUALITY_MAX_TEMPERATURE, SPEED_MAX_TOKENS, SPEED_MAX_TEMPERATURE,
    SPEED_TIER_TARGET_MS,
};
pub use system::SystemCapabilities;
pub use tuner::PerformanceOptimizer;
