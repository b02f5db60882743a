use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Smoothing factor for average response time
pub const RESPONSE_TIME_ALPHA: f64 = 0.1;

/// Smoothing factor for error rate
pub const ERROR_RATE_ALPHA: f64 = 0.05;

/// Daily buckets retained per provider
pub const MAX_DAILY_ENTRIES: usize = 90;

/// One attempted request, as seen by the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    /// Provider that was tried
    pub provider_id: String,
    /// Normalized command key
    pub command: String,
    /// Tokens consumed (0 on failure)
    pub tokens: u32,
    /// Actual cost in USD (0 on failure)
    pub cost: f64,
    /// Measured wall time of the attempt
    pub response_time_ms: u64,
    /// Whether the provider returned a response
    pub success: bool,
}

impl RequestOutcome {
    /// A successful attempt
    #[must_use]
    pub fn success(
        provider_id: impl Into<String>,
        command: impl Into<String>,
        tokens: u32,
        cost: f64,
        response_time_ms: u64,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            command: command.into(),
            tokens,
            cost,
            response_time_ms,
            success: true,
        }
    }

    /// A failed attempt
    #[must_use]
    pub fn failure(
        provider_id: impl Into<String>,
        command: impl Into<String>,
        response_time_ms: u64,
    ) -> Self {
        Self {
            provider_id: provider_id.into(),
            command: command.into(),
            tokens: 0,
            cost: 0.0,
            response_time_ms,
            success: false,
        }
    }
}

/// Usage for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    /// Calendar day
    pub date: NaiveDate,
    /// Attempts
    pub requests: u64,
    /// Failed attempts
    pub failed_requests: u64,
    /// Tokens
    pub tokens: u64,
    /// Cost in USD
    pub cost: f64,
}

impl DailyUsage {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            requests: 0,
            failed_requests: 0,
            tokens: 0,
            cost: 0.0,
        }
    }
}

/// Rolling usage and performance statistics for one provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageMetrics {
    /// Provider id
    pub provider_id: String,
    /// Attempts
    pub total_requests: u64,
    /// Failed attempts
    pub failed_requests: u64,
    /// Tokens
    pub total_tokens: u64,
    /// Cost in USD
    pub total_cost: f64,
    /// Smoothed response time of successful attempts; seeded by the first one
    pub average_response_time_ms: f64,
    /// Smoothed error rate in `[0, 1]`
    pub error_rate: f64,
    /// Last attempt
    pub last_used: Option<DateTime<Utc>>,
    /// Calendar-day buckets, oldest first
    pub daily: VecDeque<DailyUsage>,
}

impl UsageMetrics {
    /// Empty metrics for a provider
    #[must_use]
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            total_requests: 0,
            failed_requests: 0,
            total_tokens: 0,
            total_cost: 0.0,
            average_response_time_ms: 0.0,
            error_rate: 0.0,
            last_used: None,
            daily: VecDeque::new(),
        }
    }

    /// Whether any attempt has been recorded
    #[must_use]
    pub fn has_history(&self) -> bool {
        self.total_requests > 0
    }

    /// Attempts that returned a response
    #[must_use]
    pub fn successful_requests(&self) -> u64 {
        self.total_requests.saturating_sub(self.failed_requests)
    }

    /// Fold one attempt into totals, today's bucket and both averages.
    ///
    /// Only successful attempts feed the response-time average; a failure's
    /// wall time says nothing about how fast the provider answers.
    pub fn record(&mut self, outcome: &RequestOutcome, today: NaiveDate, now: DateTime<Utc>) {
        let tokens = u64::from(outcome.tokens);
        let first_success = outcome.success && self.successful_requests() == 0;

        self.total_requests += 1;
        self.total_tokens += tokens;
        self.total_cost += outcome.cost;
        if !outcome.success {
            self.failed_requests += 1;
        }
        self.last_used = Some(now);

        if let Some(bucket) = self.bucket_mut(today) {
            bucket.requests += 1;
            bucket.tokens += tokens;
            bucket.cost += outcome.cost;
            if !outcome.success {
                bucket.failed_requests += 1;
            }
        }

        if outcome.success {
            let observed = outcome.response_time_ms as f64;
            self.average_response_time_ms = if first_success {
                observed
            } else {
                smooth(self.average_response_time_ms, observed, RESPONSE_TIME_ALPHA)
            };
        }
        let error = if outcome.success { 0.0 } else { 1.0 };
        self.error_rate = smooth(self.error_rate, error, ERROR_RATE_ALPHA);
    }

    /// Bucket for `date`, created if absent. `None` when the date is older
    /// than every retained bucket and the list is full.
    fn bucket_mut(&mut self, date: NaiveDate) -> Option<&mut DailyUsage> {
        if let Some(index) = self.daily.iter().rposition(|d| d.date == date) {
            return self.daily.get_mut(index);
        }
        let full = self.daily.len() >= MAX_DAILY_ENTRIES;
        if full && self.daily.front().is_some_and(|oldest| date < oldest.date) {
            return None;
        }
        if full {
            self.daily.pop_front();
        }
        // Buckets stay sorted even if the clock moves backwards.
        let at = self.daily.partition_point(|d| d.date < date);
        self.daily.insert(at, DailyUsage::new(date));
        self.daily.get_mut(at)
    }

    /// Buckets whose date lies in `[start, end]`
    pub fn days_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> impl Iterator<Item = &DailyUsage> + '_ {
        self.daily
            .iter()
            .filter(move |d| d.date >= start && d.date <= end)
    }

    /// Cost bucketed in `[start, end]`
    #[must_use]
    pub fn cost_between(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        self.days_between(start, end).map(|d| d.cost).sum()
    }
}

/// Frequency and cost of one normalized command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandStats {
    /// Times served
    pub count: u64,
    /// Cost in USD
    pub total_cost: f64,
    /// Last time served
    pub last_used: Option<DateTime<Utc>>,
}

impl CommandStats {
    /// Average cost per use
    #[must_use]
    pub fn average_cost(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_cost / self.count as f64
        }
    }
}

fn smooth(average: f64, observation: f64, alpha: f64) -> f64 {
    alpha * observation + (1.0 - alpha) * average
}
