use crate::criteria::SelectionReason;
use crate::usage::{BudgetStatus, UsageMetrics};
use serde::{Deserialize, Serialize};
use switchboard_llm::{GenerationResponse, ProviderStatus};
use uuid::Uuid;

/// How a response was produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Request identifier
    pub request_id: Uuid,
    /// Provider that produced the response
    pub provider_id: String,
    /// Measured wall time of the successful attempt
    pub response_time_ms: u64,
    /// Whether the request carried context
    pub context_used: bool,
    /// Prompt as sent to the backend, for audit
    pub expanded_prompt: String,
    /// Whether the primary failed and an alternative answered
    pub fallback_used: bool,
    /// Why the answering provider was used
    pub selection_reason: SelectionReason,
}

/// A provider response plus routing metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedResponse {
    /// The provider's response
    pub response: GenerationResponse,
    /// Routing metadata
    pub metadata: ResponseMetadata,
}

/// One row of [`Dispatcher::status`](super::Dispatcher::status)
#[derive(Debug, Clone, Serialize)]
pub struct ProviderReport {
    /// Provider id
    pub provider_id: String,
    /// Model id
    pub model: String,
    /// Backend kind, e.g. `local-inference`
    pub backend: String,
    /// Credentials or model file present
    pub available: bool,
    /// Lifecycle status
    pub status: ProviderStatus,
    /// Usage history, if any
    pub metrics: Option<UsageMetrics>,
    /// Spend against budget windows
    pub budget: BudgetStatus,
}

/// Result of a single connectivity test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TestOutcome {
    /// The provider answered
    Pass {
        /// Round-trip time
        response_time_ms: u64,
    },
    /// The provider was reachable in principle but failed
    Fail {
        /// Failure message
        error: String,
    },
    /// No credentials or model file
    Unavailable,
}

impl TestOutcome {
    /// Short label for tables
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pass { .. } => "pass",
            Self::Fail { .. } => "fail",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Connectivity test result for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderTestResult {
    /// Provider id
    pub provider_id: String,
    /// Outcome
    #[serde(flatten)]
    pub outcome: TestOutcome,
}

/// Benchmark summary for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Provider id
    pub provider_id: String,
    /// Prompts attempted
    pub runs: u32,
    /// Prompts answered
    pub successes: u32,
    /// Prompts the vendor throttled; neither a success nor a failure
    pub rate_limited: u32,
    /// Mean latency over successful runs
    pub average_response_time_ms: f64,
    /// Completion tokens per second over successful runs
    pub tokens_per_second: f64,
    /// Share of unthrottled runs that succeeded (0.0 - 1.0)
    pub reliability: f64,
}
