//! Usage reports

use super::budget::BudgetWindow;
use super::metrics::{CommandStats, UsageMetrics};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Commands listed in a report
const TOP_COMMANDS: usize = 10;

/// Report window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsagePeriod {
    /// Today's bucket
    #[default]
    Today,
    /// Today and the six days before it
    Week,
    /// The current calendar month
    Month,
    /// Everything since tracking began
    All,
}

impl UsagePeriod {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::All => "all",
        }
    }

    fn window(&self) -> Option<BudgetWindow> {
        match self {
            Self::Today => Some(BudgetWindow::Daily),
            Self::Week => Some(BudgetWindow::Weekly),
            Self::Month => Some(BudgetWindow::Monthly),
            Self::All => None,
        }
    }
}

impl fmt::Display for UsagePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UsagePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" | "day" | "daily" => Ok(Self::Today),
            "week" | "weekly" => Ok(Self::Week),
            "month" | "monthly" => Ok(Self::Month),
            "all" => Ok(Self::All),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

/// One provider's share of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUsage {
    /// Provider id
    pub provider_id: String,
    /// Attempts in the window
    pub requests: u64,
    /// Failed attempts in the window
    pub failed_requests: u64,
    /// Tokens in the window
    pub tokens: u64,
    /// Cost in the window
    pub cost: f64,
    /// Share of all requests in the window
    pub percentage: f64,
    /// Smoothed response time (not windowed)
    pub average_response_time_ms: f64,
    /// Smoothed error rate (not windowed)
    pub error_rate: f64,
}

/// A frequently used command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandUsage {
    /// Normalized command
    pub command: String,
    /// Times served
    pub count: u64,
    /// Average cost per use
    pub average_cost: f64,
}

/// Aggregated usage for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    /// Window
    pub period: UsagePeriod,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// First day covered (None for `all`)
    pub period_start: Option<NaiveDate>,
    /// Attempts
    pub total_requests: u64,
    /// Failed attempts
    pub failed_requests: u64,
    /// Tokens
    pub total_tokens: u64,
    /// Cost in USD
    pub total_cost: f64,
    /// Per-provider breakdown, busiest first
    pub provider_breakdown: Vec<ProviderUsage>,
    /// Ten most frequent commands (all time)
    pub top_commands: Vec<CommandUsage>,
}

impl UsageReport {
    pub(crate) fn build(
        period: UsagePeriod,
        today: NaiveDate,
        metrics: &[UsageMetrics],
        commands: &HashMap<String, CommandStats>,
    ) -> Self {
        let start = period.window().map(|w| w.start(today));

        let mut breakdown: Vec<ProviderUsage> = metrics
            .iter()
            .map(|m| {
                let (requests, failed_requests, tokens, cost) = match start {
                    Some(start) => m.days_between(start, today).fold(
                        (0, 0, 0, 0.0),
                        |(r, f, t, c), d| (r + d.requests, f + d.failed_requests, t + d.tokens, c + d.cost),
                    ),
                    None => (m.total_requests, m.failed_requests, m.total_tokens, m.total_cost),
                };
                ProviderUsage {
                    provider_id: m.provider_id.clone(),
                    requests,
                    failed_requests,
                    tokens,
                    cost,
                    percentage: 0.0,
                    average_response_time_ms: m.average_response_time_ms,
                    error_rate: m.error_rate,
                }
            })
            .filter(|p| p.requests > 0)
            .collect();

        let total_requests: u64 = breakdown.iter().map(|p| p.requests).sum();
        for provider in &mut breakdown {
            provider.percentage = if total_requests == 0 {
                0.0
            } else {
                provider.requests as f64 / total_requests as f64 * 100.0
            };
        }
        breakdown.sort_by(|a, b| {
            b.requests
                .cmp(&a.requests)
                .then_with(|| a.provider_id.cmp(&b.provider_id))
        });

        let mut top_commands: Vec<CommandUsage> = commands
            .iter()
            .map(|(command, stats)| CommandUsage {
                command: command.clone(),
                count: stats.count,
                average_cost: stats.average_cost(),
            })
            .collect();
        top_commands.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.command.cmp(&b.command)));
        top_commands.truncate(TOP_COMMANDS);

        Self {
            period,
            generated_at: Utc::now(),
            period_start: start,
            total_requests,
            failed_requests: breakdown.iter().map(|p| p.failed_requests).sum(),
            total_tokens: breakdown.iter().map(|p| p.tokens).sum(),
            total_cost: breakdown.iter().map(|p| p.cost).sum(),
            provider_breakdown: breakdown,
            top_commands,
        }
    }
}

/// Format a report as plain text for the terminal
#[must_use]
pub fn format_report(report: &UsageReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("Usage report ({})\n", report.period));
    output.push_str(&format!(
        "Generated: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(start) = report.period_start {
        output.push_str(&format!("Period: {} to now\n", start.format("%Y-%m-%d")));
    }

    output.push_str("\nSummary:\n");
    output.push_str(&format!(
        "  Requests: {} ({} failed)\n",
        report.total_requests, report.failed_requests
    ));
    output.push_str(&format!("  Tokens:   {}\n", report.total_tokens));
    output.push_str(&format!("  Cost:     ${:.4}\n", report.total_cost));

    if !report.provider_breakdown.is_empty() {
        output.push_str("\nBy provider:\n");
        for p in &report.provider_breakdown {
            output.push_str(&format!(
                "  {:<12} {:>6} req ({:>5.1}%)  {:>8} tok  ${:.4}  avg {:.0}ms  err {:.1}%\n",
                p.provider_id,
                p.requests,
                p.percentage,
                p.tokens,
                p.cost,
                p.average_response_time_ms,
                p.error_rate * 100.0
            ));
        }
    }

    if !report.top_commands.is_empty() {
        output.push_str("\nTop commands:\n");
        for c in &report.top_commands {
            output.push_str(&format!(
                "  {:>4}x  {}  (avg ${:.4})\n",
                c.count, c.command, c.average_cost
            ));
        }
    }

    output
}
