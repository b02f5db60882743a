//! Tests for selector module

use super::*;
use crate::criteria::{SelectionCriteria, SelectionReason};
use crate::usage::{RequestOutcome, UsageMetrics};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use switchboard_llm::{
    Capabilities, GenerationRequest, MockProvider, Provider, ProviderConfig, Vendor,
};

fn plain_caps(tokens_per_second: f64) -> Capabilities {
    Capabilities {
        tokens_per_second,
        ..Default::default()
    }
}

fn local(id: &str, tokens_per_second: f64) -> ProviderConfig {
    ProviderConfig::local(id, "llama-3.2-3b-instruct").with_capabilities(plain_caps(tokens_per_second))
}

fn external(id: &str, tokens_per_second: f64, cost_per_1k: f64) -> ProviderConfig {
    ProviderConfig::external(id, Vendor::OpenAi, "gpt-4o")
        .with_capabilities(plain_caps(tokens_per_second))
        .with_cost_per_1k(cost_per_1k)
}

async fn ready(config: ProviderConfig) -> Arc<dyn Provider> {
    let provider = MockProvider::new(config);
    provider.initialize().await.unwrap();
    Arc::new(provider)
}

fn speed_only() -> SelectionCriteria {
    SelectionCriteria {
        prioritize_speed: true,
        prioritize_cost: false,
        prioritize_quality: false,
        ..Default::default()
    }
}

#[test]
fn test_response_time_estimate() {
    assert_eq!(estimate_response_time_ms(&local("l", 1000.0), 156), 256);
    assert_eq!(estimate_response_time_ms(&external("e", 312.0, 0.01), 156), 800);
    // A bogus throughput does not divide by zero.
    assert!(estimate_response_time_ms(&local("l", 0.0), 10) > 0);
}

#[tokio::test]
async fn test_speed_selection() {
    let providers = vec![
        ready(external("openai", 312.0, 0.002)).await,
        ready(local("local", 1000.0)).await,
    ];
    let request = GenerationRequest::new("list files").with_max_tokens(156);
    let criteria = SelectionCriteria {
        max_response_time_ms: Some(500),
        ..speed_only()
    };

    let result = ProviderSelector::new()
        .select(&request, &criteria, &providers, &HashMap::new())
        .unwrap();

    assert_eq!(result.provider_id, "local");
    assert_eq!(result.reason, SelectionReason::Speed);
    assert_eq!(result.estimated_response_time_ms, 256);
    assert_eq!(result.estimated_cost, 0.0);
    assert_eq!(result.alternatives.len(), 1);
    assert_eq!(result.alternatives[0].provider_id, "openai");
    assert_eq!(result.alternatives[0].estimated_response_time_ms, 800);
}

#[tokio::test]
async fn test_cost_ceiling_excludes_expensive_primary() {
    // The expensive provider would otherwise win on speed and quality.
    let expensive = ProviderConfig::external("premium", Vendor::Anthropic, "claude-opus-4-5")
        .with_capabilities(Capabilities {
            supports_code_generation: true,
            supports_function_calling: true,
            supports_streaming: true,
            tokens_per_second: 5000.0,
            ..Default::default()
        })
        .with_cost_per_1k(1.0);
    let providers = vec![
        ready(expensive).await,
        ready(external("cheap", 20.0, 0.0001)).await,
    ];
    let request = GenerationRequest::new("explain this error").with_max_tokens(500);
    let criteria = SelectionCriteria {
        prioritize_quality: true,
        max_cost_per_request: Some(0.05),
        ..speed_only()
    };

    let result = ProviderSelector::new()
        .select(&request, &criteria, &providers, &HashMap::new())
        .unwrap();

    assert_eq!(result.provider_id, "cheap");
    assert!(result.alternatives.iter().all(|a| a.provider_id != "premium"));
}

#[tokio::test]
async fn test_filtered_set_restored_with_fallback() {
    let providers = vec![ready(external("openai", 100.0, 0.01)).await];
    let request = GenerationRequest::new("hi");
    let criteria = SelectionCriteria {
        require_local: true,
        allow_fallback: true,
        ..Default::default()
    };

    let result = ProviderSelector::new()
        .select(&request, &criteria, &providers, &HashMap::new())
        .unwrap();
    assert_eq!(result.provider_id, "openai");
    assert_eq!(result.reason, SelectionReason::Fallback);
}

#[tokio::test]
async fn test_restored_remote_alternatives_are_not_local_required() {
    let providers = vec![
        ready(external("openai", 100.0, 0.01)).await,
        ready(external("groq", 500.0, 0.0)).await,
    ];
    let criteria = SelectionCriteria {
        require_local: true,
        allow_fallback: true,
        ..Default::default()
    };

    let result = ProviderSelector::new()
        .select(&GenerationRequest::new("hi"), &criteria, &providers, &HashMap::new())
        .unwrap();
    assert_eq!(result.reason, SelectionReason::Fallback);
    assert_eq!(result.alternatives.len(), 1);
    assert_ne!(result.alternatives[0].reason, SelectionReason::LocalRequired);
}

#[tokio::test]
async fn test_filtered_set_without_fallback_fails() {
    let providers = vec![ready(external("openai", 100.0, 0.01)).await];
    let criteria = SelectionCriteria {
        require_local: true,
        allow_fallback: false,
        ..Default::default()
    };

    let err = ProviderSelector::new()
        .select(&GenerationRequest::new("hi"), &criteria, &providers, &HashMap::new())
        .unwrap_err();
    assert!(matches!(err, crate::Error::NoProvidersAvailable(_)));
}

#[tokio::test]
async fn test_require_local() {
    let providers = vec![
        ready(external("groq", 5000.0, 0.0)).await,
        ready(local("local", 10.0)).await,
    ];
    let criteria = SelectionCriteria {
        require_local: true,
        ..Default::default()
    };

    let result = ProviderSelector::new()
        .select(&GenerationRequest::new("hi"), &criteria, &providers, &HashMap::new())
        .unwrap();
    assert_eq!(result.provider_id, "local");
    assert_eq!(result.reason, SelectionReason::LocalRequired);
    assert!(result.alternatives.is_empty());
}

#[test]
fn test_empty_registry_fails() {
    let err = ProviderSelector::new()
        .select(
            &GenerationRequest::new("hi"),
            &SelectionCriteria::default(),
            &[],
            &HashMap::new(),
        )
        .unwrap_err();
    assert!(matches!(err, crate::Error::NoProvidersAvailable(_)));
}

#[test]
fn test_unready_providers_are_ignored() {
    // Never initialized: status is `unloaded`.
    let providers: Vec<Arc<dyn Provider>> = vec![Arc::new(MockProvider::new(local("local", 50.0)))];
    let err = ProviderSelector::new()
        .select(
            &GenerationRequest::new("hi").with_provider("local"),
            &SelectionCriteria::default(),
            &providers,
            &HashMap::new(),
        )
        .unwrap_err();
    assert!(matches!(err, crate::Error::NoProvidersAvailable(_)));
}

#[tokio::test]
async fn test_explicit_provider_short_circuits() {
    let providers = vec![
        ready(local("local", 1000.0)).await,
        ready(external("openai", 50.0, 0.01)).await,
    ];
    let request = GenerationRequest::new("hi").with_provider("openai");

    let result = ProviderSelector::new()
        .select(&request, &SelectionCriteria::default(), &providers, &HashMap::new())
        .unwrap();
    assert_eq!(result.provider_id, "openai");
    assert_eq!(result.reason, SelectionReason::UserSpecified);
    assert!(result.alternatives.is_empty());
}

#[tokio::test]
async fn test_unknown_explicit_provider_falls_through() {
    let providers = vec![ready(local("local", 100.0)).await];
    let request = GenerationRequest::new("hi").with_provider("missing");

    let result = ProviderSelector::new()
        .select(&request, &SelectionCriteria::default(), &providers, &HashMap::new())
        .unwrap();
    assert_eq!(result.provider_id, "local");
    assert_ne!(result.reason, SelectionReason::UserSpecified);
}

#[tokio::test]
async fn test_alternatives_capped_at_three() {
    let mut providers = Vec::new();
    for i in 0..6 {
        providers.push(ready(external(&format!("p{i}"), 100.0 + f64::from(i), 0.001)).await);
    }

    let result = ProviderSelector::new()
        .select(
            &GenerationRequest::new("hi"),
            &SelectionCriteria::default(),
            &providers,
            &HashMap::new(),
        )
        .unwrap();
    assert_eq!(result.alternatives.len(), MAX_ALTERNATIVES);
}

#[tokio::test]
async fn test_ties_prefer_priority_then_registry_order() {
    let providers = vec![
        ready(external("first", 100.0, 0.001)).await,
        ready(external("second", 100.0, 0.001)).await,
        ready(external("preferred", 100.0, 0.001).with_priority(5)).await,
    ];

    let result = ProviderSelector::new()
        .select(
            &GenerationRequest::new("hi"),
            &SelectionCriteria::default(),
            &providers,
            &HashMap::new(),
        )
        .unwrap();
    assert_eq!(result.provider_id, "preferred");
    assert_eq!(result.alternatives[0].provider_id, "first");
    assert_eq!(result.alternatives[1].provider_id, "second");
}

#[tokio::test]
async fn test_reliability_history_breaks_tie() {
    let providers = vec![
        ready(external("flaky", 100.0, 0.001)).await,
        ready(external("steady", 100.0, 0.001)).await,
    ];

    let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
    let mut flaky = UsageMetrics::new("flaky");
    let mut steady = UsageMetrics::new("steady");
    for _ in 0..20 {
        flaky.record(&RequestOutcome::failure("flaky", "", 3000), today, Utc::now());
        steady.record(&RequestOutcome::success("steady", "", 10, 0.0, 300), today, Utc::now());
    }
    let history = HashMap::from([
        ("flaky".to_string(), flaky),
        ("steady".to_string(), steady),
    ]);

    let result = ProviderSelector::new()
        .select(
            &GenerationRequest::new("hi"),
            &SelectionCriteria::default(),
            &providers,
            &history,
        )
        .unwrap();
    assert_eq!(result.provider_id, "steady");
}

#[test]
fn test_score_breakdown() {
    let config = ProviderConfig::local("local", "llama-3.1-8b").with_capabilities(Capabilities {
        supports_code_generation: true,
        supports_function_calling: true,
        supports_streaming: true,
        tokens_per_second: 100.0,
        ..Default::default()
    });
    let criteria = SelectionCriteria {
        prioritize_speed: true,
        prioritize_cost: true,
        prioritize_quality: true,
        ..Default::default()
    };

    let score = ScoreBreakdown::compute(&config, &criteria, 0.0, 1200, None);
    assert_eq!(score.capability, 45);
    assert_eq!(score.speed, 30);
    assert_eq!(score.cost, 40);
    assert_eq!(score.quality, 25);
    assert_eq!(score.reliability, 0);
    assert_eq!(score.locality, LOCALITY_BONUS);
    assert_eq!(score.total(), 155);
    assert_eq!(score.dominant_reason(&criteria), SelectionReason::Cost);
}

#[test]
fn test_cost_tiers() {
    let config = external("e", 100.0, 0.01);
    let criteria = SelectionCriteria {
        prioritize_speed: false,
        prioritize_cost: true,
        ..Default::default()
    };
    let points = |cost| ScoreBreakdown::compute(&config, &criteria, cost, 0, None).cost;

    assert_eq!(points(0.0), 40);
    assert_eq!(points(0.0005), 30);
    assert_eq!(points(0.005), 20);
    assert_eq!(points(0.05), 10);
    assert_eq!(points(0.5), 0);
}

#[test]
fn test_dominant_reason_without_criteria_is_availability() {
    let criteria = SelectionCriteria {
        prioritize_speed: false,
        prioritize_cost: false,
        prioritize_quality: false,
        ..Default::default()
    };
    let score = ScoreBreakdown::compute(&external("e", 10.0, 0.0), &criteria, 0.0, 100, None);
    assert_eq!(score.dominant_reason(&criteria), SelectionReason::Availability);
}

#[test]
fn test_local_required_only_labels_local_candidates() {
    let criteria = SelectionCriteria {
        require_local: true,
        ..Default::default()
    };
    let local_score = ScoreBreakdown::compute(&local("l", 100.0), &criteria, 0.0, 300, None);
    let remote_score =
        ScoreBreakdown::compute(&external("e", 100.0, 0.0), &criteria, 0.0, 300, None);

    assert_eq!(local_score.dominant_reason(&criteria), SelectionReason::LocalRequired);
    assert_ne!(remote_score.dominant_reason(&criteria), SelectionReason::LocalRequired);
}

#[test]
fn test_latency_bonus_needs_a_fast_success() {
    let config = external("e", 100.0, 0.0);
    let criteria = SelectionCriteria::default();
    let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();

    let mut failing_fast = UsageMetrics::new("e");
    failing_fast.record(&RequestOutcome::failure("e", "", 5), today, Utc::now());
    let score = ScoreBreakdown::compute(&config, &criteria, 0.0, 300, Some(&failing_fast));
    assert_eq!(score.reliability, 19);

    let mut slow = UsageMetrics::new("e");
    slow.record(&RequestOutcome::success("e", "", 10, 0.0, 5000), today, Utc::now());
    let score = ScoreBreakdown::compute(&config, &criteria, 0.0, 300, Some(&slow));
    assert_eq!(score.reliability, 20);

    let mut fast = UsageMetrics::new("e");
    fast.record(&RequestOutcome::success("e", "", 10, 0.0, 400), today, Utc::now());
    let score = ScoreBreakdown::compute(&config, &criteria, 0.0, 300, Some(&fast));
    assert_eq!(score.reliability, 30);
}
