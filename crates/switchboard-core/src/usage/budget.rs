//! Advisory budgets
//!
//! Budgets never block a request; crossing 80% of a window only raises an
//! alert, and every tracked request above the threshold raises it again.

use super::metrics::UsageMetrics;
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Usage share of a window at which alerts start
pub const ALERT_THRESHOLD_PERCENT: f64 = 80.0;

/// Calendar-windowed spending ceilings for one provider (USD)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Ceiling for the current day
    pub daily: Option<f64>,
    /// Ceiling for the last seven days
    pub weekly: Option<f64>,
    /// Ceiling for the current calendar month
    pub monthly: Option<f64>,
}

impl Budget {
    /// Whether any ceiling is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.daily.is_none() && self.weekly.is_none() && self.monthly.is_none()
    }

    /// Ceiling for a window
    #[must_use]
    pub fn limit(&self, window: BudgetWindow) -> Option<f64> {
        match window {
            BudgetWindow::Daily => self.daily,
            BudgetWindow::Weekly => self.weekly,
            BudgetWindow::Monthly => self.monthly,
        }
    }
}

/// Budget window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetWindow {
    /// Today
    Daily,
    /// Today and the six days before it
    Weekly,
    /// The current calendar month
    Monthly,
}

impl BudgetWindow {
    /// All windows, shortest first
    pub const ALL: [BudgetWindow; 3] = [Self::Daily, Self::Weekly, Self::Monthly];

    /// First calendar day of the window ending on `today`
    #[must_use]
    pub fn start(&self, today: NaiveDate) -> NaiveDate {
        match self {
            Self::Daily => today,
            Self::Weekly => today.checked_sub_days(Days::new(6)).unwrap_or(today),
            Self::Monthly => today.with_day(1).unwrap_or(today),
        }
    }

    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for BudgetWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Spend against one window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStatus {
    /// Bucketed cost in the window
    pub used: f64,
    /// Ceiling, if configured
    pub limit: Option<f64>,
    /// `used / limit × 100`; 0 without a ceiling
    pub percentage: f64,
}

impl WindowStatus {
    pub(crate) fn new(used: f64, limit: Option<f64>) -> Self {
        let percentage = match limit {
            Some(limit) if limit > 0.0 => used * 100.0 / limit,
            Some(_) if used > 0.0 => 100.0,
            _ => 0.0,
        };
        Self {
            used,
            limit,
            percentage,
        }
    }

    /// Whether the alert threshold is reached
    #[must_use]
    pub fn is_alerting(&self) -> bool {
        self.limit.is_some() && self.percentage >= ALERT_THRESHOLD_PERCENT
    }
}

/// Spend against every window for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    /// Provider id
    pub provider_id: String,
    /// Today
    pub daily: WindowStatus,
    /// Last seven days
    pub weekly: WindowStatus,
    /// Current month
    pub monthly: WindowStatus,
}

impl BudgetStatus {
    pub(crate) fn compute(
        provider_id: &str,
        metrics: Option<&UsageMetrics>,
        budget: Budget,
        today: NaiveDate,
    ) -> Self {
        let used = |window: BudgetWindow| {
            metrics
                .map(|m| m.cost_between(window.start(today), today))
                .unwrap_or(0.0)
        };
        Self {
            provider_id: provider_id.to_string(),
            daily: WindowStatus::new(used(BudgetWindow::Daily), budget.daily),
            weekly: WindowStatus::new(used(BudgetWindow::Weekly), budget.weekly),
            monthly: WindowStatus::new(used(BudgetWindow::Monthly), budget.monthly),
        }
    }

    /// Status for a window
    #[must_use]
    pub fn window(&self, window: BudgetWindow) -> &WindowStatus {
        match window {
            BudgetWindow::Daily => &self.daily,
            BudgetWindow::Weekly => &self.weekly,
            BudgetWindow::Monthly => &self.monthly,
        }
    }

    /// Alerts for every window at or above the threshold
    #[must_use]
    pub fn alerts(&self) -> Vec<BudgetAlert> {
        BudgetWindow::ALL
            .iter()
            .filter_map(|&window| {
                let status = self.window(window);
                let limit = status.limit?;
                status.is_alerting().then(|| BudgetAlert {
                    provider_id: self.provider_id.clone(),
                    window,
                    threshold_limit: limit,
                    current_usage: status.used,
                    percentage_used: status.percentage,
                })
            })
            .collect()
    }
}

/// Advisory alert for a provider nearing a budget ceiling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    /// Provider id
    pub provider_id: String,
    /// Window that crossed the threshold
    pub window: BudgetWindow,
    /// Configured ceiling
    pub threshold_limit: f64,
    /// Cost so far in the window
    pub current_usage: f64,
    /// Share of the ceiling used
    pub percentage_used: f64,
}
