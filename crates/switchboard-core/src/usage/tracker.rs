//! Usage Tracker - per-provider accounting
//!
//! All maps are `DashMap`s, so each `track_request` is atomic with respect
//! to its own provider entry and concurrent requests to different providers
//! never contend.

use super::budget::{Budget, BudgetAlert, BudgetStatus};
use super::metrics::{CommandStats, RequestOutcome, UsageMetrics};
use super::report::{UsagePeriod, UsageReport};
use super::store::{UsageSnapshot, UsageStore};
use crate::events::{EventBus, RouterEvent};
use chrono::{Local, NaiveDate, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Concurrent usage tracker
#[derive(Debug)]
pub struct UsageTracker {
    metrics: DashMap<String, UsageMetrics>,
    commands: DashMap<String, CommandStats>,
    budgets: DashMap<String, Budget>,
    events: EventBus,
    store: Option<UsageStore>,
}

impl UsageTracker {
    /// In-memory tracker
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            metrics: DashMap::new(),
            commands: DashMap::new(),
            budgets: DashMap::new(),
            events,
            store: None,
        }
    }

    /// Tracker persisted to `path`, restoring whatever state is already there
    pub async fn open(path: impl Into<PathBuf>, events: EventBus) -> Self {
        let store = UsageStore::new(path);
        let mut tracker = Self::new(events);

        if let Some(snapshot) = store.load().await {
            info!(
                path = %store.path().display(),
                providers = snapshot.metrics.len(),
                "Restored usage state"
            );
            tracker.restore(snapshot);
        }
        tracker.store = Some(store);
        tracker
    }

    fn restore(&mut self, snapshot: UsageSnapshot) {
        for metrics in snapshot.metrics {
            self.metrics.insert(metrics.provider_id.clone(), metrics);
        }
        for (command, stats) in snapshot.commands {
            self.commands.insert(command, stats);
        }
        for (provider, budget) in snapshot.budgets {
            self.budgets.insert(provider, budget);
        }
    }

    /// Record one attempt and evaluate that provider's budgets
    pub async fn track_request(&self, outcome: RequestOutcome) -> Vec<BudgetAlert> {
        self.track_request_on(outcome, Local::now().date_naive())
            .await
    }

    /// Record one attempt against an explicit calendar day
    pub async fn track_request_on(
        &self,
        outcome: RequestOutcome,
        today: NaiveDate,
    ) -> Vec<BudgetAlert> {
        let now = Utc::now();

        self.metrics
            .entry(outcome.provider_id.clone())
            .or_insert_with(|| UsageMetrics::new(&outcome.provider_id))
            .record(&outcome, today, now);

        if outcome.success && !outcome.command.is_empty() {
            let mut stats = self.commands.entry(outcome.command.clone()).or_default();
            stats.count += 1;
            stats.total_cost += outcome.cost;
            stats.last_used = Some(now);
        }

        debug!(
            provider = %outcome.provider_id,
            success = outcome.success,
            tokens = outcome.tokens,
            cost = outcome.cost,
            response_time_ms = outcome.response_time_ms,
            "Tracked request"
        );

        let alerts = self.check_budget(&outcome.provider_id, today);
        for alert in &alerts {
            warn!(
                provider = %alert.provider_id,
                window = %alert.window,
                used = alert.current_usage,
                limit = alert.threshold_limit,
                percentage = alert.percentage_used,
                "Budget threshold reached"
            );
            self.events.publish(RouterEvent::BudgetAlert(alert.clone()));
        }

        self.persist().await;
        alerts
    }

    fn check_budget(&self, provider_id: &str, today: NaiveDate) -> Vec<BudgetAlert> {
        let Some(budget) = self.budget(provider_id) else {
            return Vec::new();
        };
        self.budget_status_on(provider_id, budget, today).alerts()
    }

    /// Write current state to the store, if any. Failures are logged.
    pub async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(e) = store.save_with(|| self.snapshot()).await {
            warn!(error = %e, "Failed to persist usage state");
        }
    }

    /// Copy of the whole state
    #[must_use]
    pub fn snapshot(&self) -> UsageSnapshot {
        UsageSnapshot {
            saved_at: Some(Utc::now()),
            metrics: self.all_metrics(),
            commands: self
                .commands
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            budgets: self
                .budgets
                .iter()
                .map(|e| (e.key().clone(), *e.value()))
                .collect(),
        }
    }

    /// Metrics for a provider
    #[must_use]
    pub fn metrics(&self, provider_id: &str) -> Option<UsageMetrics> {
        self.metrics.get(provider_id).map(|m| m.clone())
    }

    /// Metrics for every provider with history, sorted by id
    #[must_use]
    pub fn all_metrics(&self) -> Vec<UsageMetrics> {
        let mut all: Vec<UsageMetrics> = self.metrics.iter().map(|m| m.value().clone()).collect();
        all.sort_by(|a, b| a.provider_id.cmp(&b.provider_id));
        all
    }

    /// Metrics keyed by provider id, for the selector
    #[must_use]
    pub fn metrics_map(&self) -> HashMap<String, UsageMetrics> {
        self.metrics
            .iter()
            .map(|m| (m.key().clone(), m.value().clone()))
            .collect()
    }

    /// Set (or clear, with an empty budget) a provider's budget
    pub fn set_budget(&self, provider_id: impl Into<String>, budget: Budget) {
        let provider_id = provider_id.into();
        if budget.is_empty() {
            self.budgets.remove(&provider_id);
        } else {
            info!(provider = %provider_id, ?budget, "Budget set");
            self.budgets.insert(provider_id, budget);
        }
    }

    /// A provider's budget
    #[must_use]
    pub fn budget(&self, provider_id: &str) -> Option<Budget> {
        self.budgets.get(provider_id).map(|b| *b)
    }

    /// Spend against each window for a provider
    #[must_use]
    pub fn budget_status(&self, provider_id: &str) -> BudgetStatus {
        let budget = self.budget(provider_id).unwrap_or_default();
        self.budget_status_on(provider_id, budget, Local::now().date_naive())
    }

    fn budget_status_on(&self, provider_id: &str, budget: Budget, today: NaiveDate) -> BudgetStatus {
        let metrics = self.metrics.get(provider_id);
        BudgetStatus::compute(provider_id, metrics.as_deref(), budget, today)
    }

    /// Budget status on an explicit calendar day
    #[must_use]
    pub fn budget_status_at(&self, provider_id: &str, today: NaiveDate) -> BudgetStatus {
        let budget = self.budget(provider_id).unwrap_or_default();
        self.budget_status_on(provider_id, budget, today)
    }

    /// Aggregate usage for a period
    #[must_use]
    pub fn generate_report(&self, period: UsagePeriod) -> UsageReport {
        self.generate_report_on(period, Local::now().date_naive())
    }

    /// Aggregate usage for a period ending on an explicit calendar day
    #[must_use]
    pub fn generate_report_on(&self, period: UsagePeriod, today: NaiveDate) -> UsageReport {
        let commands: HashMap<String, CommandStats> = self
            .commands
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        UsageReport::build(period, today, &self.all_metrics(), &commands)
    }
}
