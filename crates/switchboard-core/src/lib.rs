//! Switchboard Core - Routing Engine
//!
//! This crate decides where each request goes and keeps the books:
//! - Criteria: selection weighting and per-call overrides
//! - Selector: multi-criteria provider ranking
//! - Usage: per-provider metrics, budgets, reports and persistence
//! - Optimizer: runtime tuning for on-device providers
//! - Dispatcher: selection, execution and one-shot fallback
//! - Events: broadcast notifications for UIs and logs
//! - Config: router settings and registry construction

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod criteria;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod models;
pub mod optimizer;
pub mod registry;
pub mod selector;
pub mod usage;

pub use config::{LocalSettings, ProvidersSettings, RemoteSettings, RouterSettings, UsageSettings};
pub use criteria::{Alternative, CriteriaOverrides, SelectionCriteria, SelectionReason, SelectionResult};
pub use dispatcher::{
    BenchmarkResult, Dispatcher, ProviderReport, ProviderTestResult, ResponseMetadata,
    RoutedResponse, TestOutcome,
};
pub use error::{Error, Result};
pub use events::{EventBus, RouterEvent};
pub use optimizer::{PerformanceOptimizer, PerformanceProfile, SystemCapabilities};
pub use registry::build_providers;
pub use selector::ProviderSelector;
pub use usage::{
    format_report, Budget, BudgetAlert, BudgetStatus, RequestOutcome, UsageMetrics, UsagePeriod,
    UsageReport, UsageTracker,
};
