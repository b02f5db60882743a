//! Tests for usage module

use super::*;
use crate::events::{EventBus, RouterEvent};
use chrono::{Days, NaiveDate};

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn paid(provider: &str, cost: f64) -> RequestOutcome {
    RequestOutcome::success(provider, "git status", 100, cost, 300)
}

#[tokio::test]
async fn test_tracks_success_and_failure() {
    let tracker = UsageTracker::new(EventBus::default());
    let today = day(2026, 3, 10);

    tracker.track_request_on(paid("openai", 0.01), today).await;
    tracker
        .track_request_on(RequestOutcome::failure("openai", "git status", 900), today)
        .await;

    let metrics = tracker.metrics("openai").unwrap();
    assert_eq!(metrics.total_requests, 2);
    assert_eq!(metrics.failed_requests, 1);
    assert_eq!(metrics.total_tokens, 100);
    assert!((metrics.total_cost - 0.01).abs() < 1e-12);
    assert!(metrics.last_used.is_some());
    assert_eq!(metrics.daily.len(), 1);
    assert_eq!(metrics.daily[0].requests, 2);
    assert_eq!(metrics.daily[0].failed_requests, 1);
}

#[tokio::test]
async fn test_metrics_created_lazily() {
    let tracker = UsageTracker::new(EventBus::default());
    assert!(tracker.metrics("local").is_none());
    assert!(tracker.all_metrics().is_empty());
}

#[test]
fn test_response_time_converges() {
    let mut metrics = UsageMetrics::new("local");
    let today = day(2026, 3, 10);
    let target = 250.0;

    for _ in 0..60 {
        metrics.record(
            &RequestOutcome::success("local", "", 10, 0.0, 250),
            today,
            chrono::Utc::now(),
        );
    }

    let deviation = (metrics.average_response_time_ms - target).abs() / target;
    assert!(deviation < 0.01, "average {} not within 1%", metrics.average_response_time_ms);
}

#[test]
fn test_response_time_seeded_by_first_success() {
    let mut metrics = UsageMetrics::new("anthropic");
    let today = day(2026, 3, 10);

    metrics.record(
        &RequestOutcome::success("anthropic", "", 10, 0.0, 5000),
        today,
        chrono::Utc::now(),
    );
    assert_eq!(metrics.average_response_time_ms, 5000.0);

    metrics.record(
        &RequestOutcome::success("anthropic", "", 10, 0.0, 4000),
        today,
        chrono::Utc::now(),
    );
    let expected = 5000.0 + RESPONSE_TIME_ALPHA * (4000.0 - 5000.0);
    assert!((metrics.average_response_time_ms - expected).abs() < 1e-9);
}

#[test]
fn test_failures_do_not_move_response_time() {
    let mut metrics = UsageMetrics::new("groq");
    let today = day(2026, 3, 10);

    metrics.record(&RequestOutcome::failure("groq", "", 20), today, chrono::Utc::now());
    assert_eq!(metrics.average_response_time_ms, 0.0);
    assert_eq!(metrics.successful_requests(), 0);

    // The first success after failures still seeds the average.
    metrics.record(&RequestOutcome::success("groq", "", 10, 0.0, 1500), today, chrono::Utc::now());
    assert_eq!(metrics.average_response_time_ms, 1500.0);

    metrics.record(&RequestOutcome::failure("groq", "", 10), today, chrono::Utc::now());
    assert_eq!(metrics.average_response_time_ms, 1500.0);
    assert_eq!(metrics.successful_requests(), 1);
}

#[test]
fn test_error_rate_smoothing() {
    let mut metrics = UsageMetrics::new("openai");
    let today = day(2026, 3, 10);

    metrics.record(&RequestOutcome::failure("openai", "", 100), today, chrono::Utc::now());
    assert!((metrics.error_rate - ERROR_RATE_ALPHA).abs() < 1e-12);

    metrics.record(&paid("openai", 0.0), today, chrono::Utc::now());
    let expected = ERROR_RATE_ALPHA * (1.0 - ERROR_RATE_ALPHA);
    assert!((metrics.error_rate - expected).abs() < 1e-12);
}

#[test]
fn test_daily_buckets_capped() {
    let mut metrics = UsageMetrics::new("openai");
    let start = day(2026, 1, 1);

    for offset in 0..(MAX_DAILY_ENTRIES as u64 + 10) {
        let date = start.checked_add_days(Days::new(offset)).unwrap();
        metrics.record(&paid("openai", 0.01), date, chrono::Utc::now());
    }

    assert_eq!(metrics.daily.len(), MAX_DAILY_ENTRIES);
    assert_eq!(metrics.daily.front().unwrap().date, day(2026, 1, 11));
    assert_eq!(metrics.total_requests, MAX_DAILY_ENTRIES as u64 + 10);
}

#[test]
fn test_out_of_order_day_keeps_buckets_sorted() {
    let mut metrics = UsageMetrics::new("openai");
    metrics.record(&paid("openai", 0.01), day(2026, 3, 10), chrono::Utc::now());
    metrics.record(&paid("openai", 0.01), day(2026, 3, 8), chrono::Utc::now());

    let dates: Vec<_> = metrics.daily.iter().map(|d| d.date).collect();
    assert_eq!(dates, vec![day(2026, 3, 8), day(2026, 3, 10)]);
}

#[tokio::test]
async fn test_daily_budget_alert_at_threshold() {
    let events = EventBus::default();
    let mut rx = events.subscribe();
    let tracker = UsageTracker::new(events);
    let today = day(2026, 3, 10);

    tracker.set_budget(
        "openai",
        Budget {
            daily: Some(5.0),
            ..Default::default()
        },
    );

    for _ in 0..4 {
        let alerts = tracker.track_request_on(paid("openai", 0.75), today).await;
        assert!(alerts.is_empty());
    }
    // $3.00 so far; this brings the day to exactly $4.00 (80%).
    let alerts = tracker.track_request_on(paid("openai", 1.0), today).await;

    assert_eq!(alerts.len(), 1);
    let alert = &alerts[0];
    assert_eq!(alert.window, BudgetWindow::Daily);
    assert_eq!(alert.provider_id, "openai");
    assert_eq!(alert.threshold_limit, 5.0);
    assert!(alert.percentage_used >= ALERT_THRESHOLD_PERCENT);

    match rx.try_recv().unwrap() {
        RouterEvent::BudgetAlert(published) => assert_eq!(&published, alert),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn test_budget_alert_repeats_above_threshold() {
    let tracker = UsageTracker::new(EventBus::default());
    let today = day(2026, 3, 10);
    tracker.set_budget(
        "openai",
        Budget {
            daily: Some(5.0),
            ..Default::default()
        },
    );

    tracker.track_request_on(paid("openai", 4.0), today).await;
    let first = tracker.track_request_on(paid("openai", 0.01), today).await;
    let second = tracker.track_request_on(paid("openai", 0.01), today).await;
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn test_budget_windows() {
    let tracker = UsageTracker::new(EventBus::default());
    let today = day(2026, 3, 10);
    tracker.set_budget(
        "openai",
        Budget {
            daily: Some(10.0),
            weekly: Some(10.0),
            monthly: Some(10.0),
        },
    );

    tracker.track_request_on(paid("openai", 1.0), day(2026, 2, 28)).await;
    tracker.track_request_on(paid("openai", 2.0), day(2026, 3, 2)).await;
    tracker.track_request_on(paid("openai", 3.0), day(2026, 3, 5)).await;
    tracker.track_request_on(paid("openai", 4.0), today).await;

    let status = tracker.budget_status_at("openai", today);
    assert!((status.daily.used - 4.0).abs() < 1e-9);
    // March 4 through March 10
    assert!((status.weekly.used - 7.0).abs() < 1e-9);
    // March only
    assert!((status.monthly.used - 9.0).abs() < 1e-9);
    assert!((status.monthly.percentage - 90.0).abs() < 1e-9);
}

#[test]
fn test_budget_status_without_limits() {
    let tracker = UsageTracker::new(EventBus::default());
    let status = tracker.budget_status("nobody");
    assert_eq!(status.daily.limit, None);
    assert_eq!(status.daily.percentage, 0.0);
    assert!(status.alerts().is_empty());
}

#[test]
fn test_empty_budget_clears() {
    let tracker = UsageTracker::new(EventBus::default());
    tracker.set_budget(
        "openai",
        Budget {
            weekly: Some(1.0),
            ..Default::default()
        },
    );
    assert!(tracker.budget("openai").is_some());
    tracker.set_budget("openai", Budget::default());
    assert!(tracker.budget("openai").is_none());
}

#[tokio::test]
async fn test_report_breakdown_sums_to_total() {
    let tracker = UsageTracker::new(EventBus::default());
    let today = day(2026, 3, 10);

    tracker.track_request_on(paid("openai", 0.013), today).await;
    tracker.track_request_on(paid("openai", 0.027), day(2026, 3, 9)).await;
    tracker.track_request_on(paid("anthropic", 0.101), today).await;
    tracker
        .track_request_on(RequestOutcome::success("local", "ls", 40, 0.0, 120), today)
        .await;
    tracker
        .track_request_on(RequestOutcome::failure("groq", "ls", 2000), day(2026, 2, 1))
        .await;

    for period in [UsagePeriod::Today, UsagePeriod::Week, UsagePeriod::Month, UsagePeriod::All] {
        let report = tracker.generate_report_on(period, today);
        let breakdown_cost: f64 = report.provider_breakdown.iter().map(|p| p.cost).sum();
        let breakdown_requests: u64 = report.provider_breakdown.iter().map(|p| p.requests).sum();
        assert!((breakdown_cost - report.total_cost).abs() < 1e-9, "{period}");
        assert_eq!(breakdown_requests, report.total_requests, "{period}");

        let share: f64 = report.provider_breakdown.iter().map(|p| p.percentage).sum();
        if report.total_requests > 0 {
            assert!((share - 100.0).abs() < 1e-6, "{period}");
        }
    }

    let today_report = tracker.generate_report_on(UsagePeriod::Today, today);
    assert_eq!(today_report.total_requests, 3);
    let all = tracker.generate_report_on(UsagePeriod::All, today);
    assert_eq!(all.total_requests, 5);
    assert_eq!(all.failed_requests, 1);
}

#[tokio::test]
async fn test_top_commands() {
    let tracker = UsageTracker::new(EventBus::default());
    let today = day(2026, 3, 10);

    for i in 0..12 {
        let command = format!("command {i}");
        for _ in 0..=i {
            tracker
                .track_request_on(RequestOutcome::success("openai", &command, 10, 0.002, 100), today)
                .await;
        }
    }
    // Failed attempts do not count as served commands.
    tracker
        .track_request_on(RequestOutcome::failure("openai", "command 0", 100), today)
        .await;

    let report = tracker.generate_report_on(UsagePeriod::All, today);
    assert_eq!(report.top_commands.len(), 10);
    assert_eq!(report.top_commands[0].command, "command 11");
    assert_eq!(report.top_commands[0].count, 12);
    assert!((report.top_commands[0].average_cost - 0.002).abs() < 1e-12);
    assert!(report.top_commands.iter().all(|c| c.command != "command 0"));
}

#[test]
fn test_usage_period_parsing() {
    assert_eq!("today".parse::<UsagePeriod>().unwrap(), UsagePeriod::Today);
    assert_eq!("Week".parse::<UsagePeriod>().unwrap(), UsagePeriod::Week);
    assert_eq!("monthly".parse::<UsagePeriod>().unwrap(), UsagePeriod::Month);
    assert_eq!("all".parse::<UsagePeriod>().unwrap(), UsagePeriod::All);
    assert!("fortnight".parse::<UsagePeriod>().is_err());
}

#[tokio::test]
async fn test_format_report() {
    let tracker = UsageTracker::new(EventBus::default());
    let today = day(2026, 3, 10);
    tracker.track_request_on(paid("openai", 0.5), today).await;

    let text = format_report(&tracker.generate_report_on(UsagePeriod::Today, today));
    assert!(text.contains("Usage report (today)"));
    assert!(text.contains("openai"));
    assert!(text.contains("git status"));
}

#[tokio::test]
async fn test_persistence_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("usage.json");
    let today = day(2026, 3, 10);

    {
        let tracker = UsageTracker::open(&path, EventBus::default()).await;
        tracker.set_budget(
            "openai",
            Budget {
                monthly: Some(20.0),
                ..Default::default()
            },
        );
        tracker.track_request_on(paid("openai", 0.25), today).await;
    }
    assert!(path.exists());

    let restored = UsageTracker::open(&path, EventBus::default()).await;
    let metrics = restored.metrics("openai").unwrap();
    assert_eq!(metrics.total_requests, 1);
    assert!((metrics.total_cost - 0.25).abs() < 1e-12);
    assert_eq!(restored.budget("openai").unwrap().monthly, Some(20.0));
    assert_eq!(
        restored
            .generate_report_on(UsagePeriod::All, today)
            .top_commands[0]
            .command,
        "git status"
    );
}

#[tokio::test]
async fn test_corrupt_state_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("usage.json");
    std::fs::write(&path, "{ not json").unwrap();

    let tracker = UsageTracker::open(&path, EventBus::default()).await;
    assert!(tracker.all_metrics().is_empty());

    // The next write replaces the corrupt file.
    tracker.track_request(paid("local", 0.0)).await;
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(serde_json::from_str::<UsageSnapshot>(&raw).is_ok());
}

#[tokio::test]
async fn test_missing_state_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let tracker = UsageTracker::open(dir.path().join("absent.json"), EventBus::default()).await;
    assert!(tracker.all_metrics().is_empty());
}
