//! Usage accounting
//!
//! Records every attempted request per provider, keeps exponentially
//! smoothed latency and error statistics, buckets cost and tokens per
//! calendar day, and raises advisory budget alerts.
//!
//! # Module Structure
//!
//! - `metrics`: per-provider totals, smoothing and daily buckets
//! - `budget`: budget windows, status and alerts
//! - `report`: period reports and command statistics
//! - `store`: JSON persistence
//! - `tracker`: the concurrent `UsageTracker`

mod budget;
mod metrics;
mod report;
mod store;
mod tracker;

#[cfg(test)]
mod tests;

pub use budget::{Budget, BudgetAlert, BudgetStatus, BudgetWindow, WindowStatus, ALERT_THRESHOLD_PERCENT};
pub use metrics::{
    CommandStats, DailyUsage, RequestOutcome, UsageMetrics, ERROR_RATE_ALPHA, MAX_DAILY_ENTRIES,
    RESPONSE_TIME_ALPHA,
};
pub use report::{format_report, CommandUsage, ProviderUsage, UsagePeriod, UsageReport};
pub use store::{UsageSnapshot, UsageStore};
pub use tracker::UsageTracker;
