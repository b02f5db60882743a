//! Model family heuristics
//!
//! Model ids are free-form vendor strings. Both quality scoring and the
//! performance profiles only need a coarse tier, derived from the family
//! name or, for open-weight models, the parameter count in the id.

use regex::Regex;
use std::sync::LazyLock;

/// Parameter count such as `70b`, `3.8b` or `8B` delimited by non-alphanumerics
static PARAM_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9.])(\d+(?:\.\d+)?)b(?:$|[^a-z0-9])")
        .expect("PARAM_SIZE is a compile-time constant")
});

/// Coarse capability tier of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModelTier {
    /// Small local or unknown models
    Compact,
    /// Mid-size and "mini" class models
    Standard,
    /// Strong general models
    Advanced,
    /// Flagship models
    Frontier,
}

impl ModelTier {
    /// Quality score awarded by the selector
    #[must_use]
    pub fn quality_points(&self) -> i32 {
        match self {
            Self::Frontier => 40,
            Self::Advanced => 35,
            Self::Standard => 25,
            Self::Compact => 15,
        }
    }
}

/// Parameter count in billions, when the id spells it out
#[must_use]
pub fn parameter_count_billions(model: &str) -> Option<f64> {
    PARAM_SIZE
        .captures(model)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Tier of a model id
#[must_use]
pub fn model_tier(model: &str) -> ModelTier {
    let id = model.to_lowercase();
    let small_variant = id.contains("mini") || id.contains("nano") || id.contains("haiku");

    if id.contains("opus") {
        return ModelTier::Frontier;
    }
    if (id.contains("gpt-4") || id.contains("gpt-5")) && !small_variant {
        return ModelTier::Frontier;
    }
    if id.contains("sonnet") {
        return ModelTier::Advanced;
    }
    if small_variant || id.contains("gpt-3.5") {
        return ModelTier::Standard;
    }

    match parameter_count_billions(&id) {
        Some(b) if b >= 65.0 => ModelTier::Frontier,
        Some(b) if b >= 30.0 => ModelTier::Advanced,
        Some(b) if b >= 7.0 => ModelTier::Standard,
        _ => ModelTier::Compact,
    }
}
