//! Router settings
//!
//! Deserialized by the binary from layered TOML and environment sources.
//! Every section has defaults, so an empty document is a valid configuration.

use crate::criteria::SelectionCriteria;
use crate::error::{Error, Result};
use crate::usage::Budget;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use switchboard_llm::RateLimit;

/// Top-level router settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterSettings {
    /// Default selection criteria, merged with per-call overrides
    #[serde(default)]
    pub criteria: SelectionCriteria,
    /// Usage persistence
    #[serde(default)]
    pub usage: UsageSettings,
    /// Per-provider budgets applied when no budget has been persisted
    #[serde(default)]
    pub budgets: HashMap<String, Budget>,
    /// Backend settings
    #[serde(default)]
    pub providers: ProvidersSettings,
    /// Event channel capacity
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Seconds before an errored provider is re-initialized (0 disables)
    #[serde(default = "default_error_cooldown_secs")]
    pub error_cooldown_secs: u64,
}

fn default_event_capacity() -> usize {
    256
}

fn default_error_cooldown_secs() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            criteria: SelectionCriteria::default(),
            usage: UsageSettings::default(),
            budgets: HashMap::new(),
            providers: ProvidersSettings::default(),
            event_capacity: default_event_capacity(),
            error_cooldown_secs: default_error_cooldown_secs(),
        }
    }
}

impl RouterSettings {
    /// Reject values the router cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.event_capacity == 0 {
            return Err(Error::Config("event_capacity must be at least 1".to_string()));
        }
        if let Some(max) = self.criteria.max_cost_per_request {
            if !max.is_finite() || max < 0.0 {
                return Err(Error::Config(format!(
                    "criteria.max_cost_per_request must be a non-negative number, got {max}"
                )));
            }
        }
        for (provider, budget) in &self.budgets {
            for limit in [budget.daily, budget.weekly, budget.monthly].into_iter().flatten() {
                if !limit.is_finite() || limit <= 0.0 {
                    return Err(Error::Config(format!(
                        "budget for {provider} must be positive, got {limit}"
                    )));
                }
            }
        }
        self.providers.validate()
    }

    /// Cooldown before automatic re-initialization, if enabled
    #[must_use]
    pub fn error_cooldown(&self) -> Option<Duration> {
        (self.error_cooldown_secs > 0).then(|| Duration::from_secs(self.error_cooldown_secs))
    }
}

/// Usage persistence settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSettings {
    /// Write usage state to disk after every tracked request
    #[serde(default = "default_true")]
    pub persist: bool,
    /// State file; defaults to `<data dir>/switchboard/usage.json`
    #[serde(default)]
    pub state_path: Option<PathBuf>,
}

impl Default for UsageSettings {
    fn default() -> Self {
        Self {
            persist: true,
            state_path: None,
        }
    }
}

impl UsageSettings {
    /// Resolved state file, or `None` when persistence is off
    #[must_use]
    pub fn resolved_state_path(&self) -> Option<PathBuf> {
        if !self.persist {
            return None;
        }
        self.state_path.clone().or_else(|| {
            dirs::data_local_dir()
                .or_else(dirs::home_dir)
                .map(|dir| dir.join("switchboard").join("usage.json"))
        })
    }
}

/// Settings for every backend kind
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersSettings {
    /// On-device inference
    #[serde(default)]
    pub local: LocalSettings,
    /// Groq
    #[serde(default)]
    pub groq: RemoteSettings,
    /// OpenAI
    #[serde(default)]
    pub openai: RemoteSettings,
    /// Anthropic
    #[serde(default)]
    pub anthropic: RemoteSettings,
}

impl ProvidersSettings {
    fn validate(&self) -> Result<()> {
        if let Some(tps) = self.local.tokens_per_second {
            if !tps.is_finite() || tps <= 0.0 {
                return Err(Error::Config(format!(
                    "providers.local.tokens_per_second must be positive, got {tps}"
                )));
            }
        }
        for (name, remote) in [
            ("groq", &self.groq),
            ("openai", &self.openai),
            ("anthropic", &self.anthropic),
        ] {
            if let Some(cost) = remote.cost_per_1k_tokens {
                if !cost.is_finite() || cost < 0.0 {
                    return Err(Error::Config(format!(
                        "providers.{name}.cost_per_1k_tokens must be non-negative, got {cost}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// On-device backend settings; unset fields fall back to the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Register this backend
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Model weights
    #[serde(default)]
    pub model_path: Option<PathBuf>,
    /// Model id
    #[serde(default)]
    pub model: Option<String>,
    /// Runtime URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// Expected throughput on this machine
    #[serde(default)]
    pub tokens_per_second: Option<f64>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model_path: None,
            model: None,
            base_url: None,
            tokens_per_second: None,
            timeout_secs: None,
        }
    }
}

/// Remote API backend settings; credentials always come from the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Register this backend
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Model id
    #[serde(default)]
    pub model: Option<String>,
    /// API base URL
    #[serde(default)]
    pub base_url: Option<String>,
    /// List price override (USD per 1K tokens)
    #[serde(default)]
    pub cost_per_1k_tokens: Option<f64>,
    /// Vendor rate limit override
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: None,
            base_url: None,
            cost_per_1k_tokens: None,
            rate_limit: None,
            timeout_secs: None,
        }
    }
}
