use crate::criteria::SelectionReason;
use crate::usage::BudgetAlert;
use serde::Serialize;
use uuid::Uuid;

/// Notifications emitted by the router.
///
/// Events never carry prompts, responses or credentials.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouterEvent {
    /// Providers were initialized
    Initialized {
        /// Every registered provider
        providers: Vec<String>,
        /// Providers that reached `ready`
        ready: Vec<String>,
    },
    /// A request was served
    ResponseGenerated {
        /// Request identifier
        request_id: Uuid,
        /// Provider that served it
        provider_id: String,
        /// Why that provider was used
        reason: SelectionReason,
        /// Measured response time
        response_time_ms: u64,
        /// Total tokens
        tokens: u32,
        /// Actual cost (USD)
        cost: f64,
        /// Whether the primary failed first
        fallback_used: bool,
    },
    /// A provider crossed 80% of a budget window
    BudgetAlert(BudgetAlert),
    /// The primary failed and the request moved to an alternative
    ProviderSwitched {
        /// Request identifier
        request_id: Uuid,
        /// Failed primary
        from: String,
        /// Alternative being tried
        to: String,
        /// Sanitized failure message
        error: String,
    },
}

impl RouterEvent {
    /// Event name
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialized { .. } => "initialized",
            Self::ResponseGenerated { .. } => "response_generated",
            Self::BudgetAlert(_) => "budget_alert",
            Self::ProviderSwitched { .. } => "provider_switched",
        }
    }

    /// Request id, for per-request events
    #[must_use]
    pub fn request_id(&self) -> Option<Uuid> {
        match self {
            Self::ResponseGenerated { request_id, .. } | Self::ProviderSwitched { request_id, .. } => {
                Some(*request_id)
            }
            Self::Initialized { .. } | Self::BudgetAlert(_) => None,
        }
    }
}
