//! Selection criteria and results

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weighting used to pick among ready providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCriteria {
    /// Favor low estimated response time
    pub prioritize_speed: bool,
    /// Favor low estimated cost
    pub prioritize_cost: bool,
    /// Favor stronger model families
    pub prioritize_quality: bool,
    /// Drop providers whose cost estimate exceeds this (USD)
    pub max_cost_per_request: Option<f64>,
    /// Desired response time. Informational only; never filters.
    pub max_response_time_ms: Option<u64>,
    /// Only consider on-device providers
    pub require_local: bool,
    /// Restore the unfiltered set when filtering empties it, and retry once on failure
    pub allow_fallback: bool,
}

impl Default for SelectionCriteria {
    fn default() -> Self {
        Self {
            prioritize_speed: true,
            prioritize_cost: true,
            prioritize_quality: false,
            max_cost_per_request: None,
            max_response_time_ms: None,
            require_local: false,
            allow_fallback: true,
        }
    }
}

impl SelectionCriteria {
    /// Apply per-call overrides on top of these criteria
    #[must_use]
    pub fn merge(&self, overrides: &CriteriaOverrides) -> Self {
        Self {
            prioritize_speed: overrides.prioritize_speed.unwrap_or(self.prioritize_speed),
            prioritize_cost: overrides.prioritize_cost.unwrap_or(self.prioritize_cost),
            prioritize_quality: overrides
                .prioritize_quality
                .unwrap_or(self.prioritize_quality),
            max_cost_per_request: overrides
                .max_cost_per_request
                .or(self.max_cost_per_request),
            max_response_time_ms: overrides
                .max_response_time_ms
                .or(self.max_response_time_ms),
            require_local: overrides.require_local.unwrap_or(self.require_local),
            allow_fallback: overrides.allow_fallback.unwrap_or(self.allow_fallback),
        }
    }
}

/// Per-call criteria; unset fields keep the router default
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaOverrides {
    /// See [`SelectionCriteria::prioritize_speed`]
    pub prioritize_speed: Option<bool>,
    /// See [`SelectionCriteria::prioritize_cost`]
    pub prioritize_cost: Option<bool>,
    /// See [`SelectionCriteria::prioritize_quality`]
    pub prioritize_quality: Option<bool>,
    /// See [`SelectionCriteria::max_cost_per_request`]
    pub max_cost_per_request: Option<f64>,
    /// See [`SelectionCriteria::max_response_time_ms`]
    pub max_response_time_ms: Option<u64>,
    /// See [`SelectionCriteria::require_local`]
    pub require_local: Option<bool>,
    /// See [`SelectionCriteria::allow_fallback`]
    pub allow_fallback: Option<bool>,
}

/// Why a provider was (or would have been) chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// Named explicitly by the request
    UserSpecified,
    /// Fastest estimate
    Speed,
    /// Cheapest estimate
    Cost,
    /// Strongest model family
    Quality,
    /// Only local providers were allowed
    LocalRequired,
    /// Best of what was ready
    Availability,
    /// Served after the primary failed
    Fallback,
}

impl SelectionReason {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserSpecified => "user-specified",
            Self::Speed => "speed",
            Self::Cost => "cost",
            Self::Quality => "quality",
            Self::LocalRequired => "local-required",
            Self::Availability => "availability",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked runner-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alternative {
    /// Provider id
    pub provider_id: String,
    /// Dominant reason it scored where it did
    pub reason: SelectionReason,
    /// Estimated cost (USD)
    pub estimated_cost: f64,
    /// Estimated response time
    pub estimated_response_time_ms: u64,
}

/// Outcome of provider selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    /// Chosen provider
    pub provider_id: String,
    /// Why it was chosen
    pub reason: SelectionReason,
    /// Estimated cost (USD)
    pub estimated_cost: f64,
    /// Estimated response time
    pub estimated_response_time_ms: u64,
    /// Up to three ranked alternatives
    pub alternatives: Vec<Alternative>,
}
