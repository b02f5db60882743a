//! Tests for provider module

use super::*;
use crate::error::Error;
use crate::request::GenerationRequest;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn external(id: &str) -> ProviderConfig {
    ProviderConfig::external(id, Vendor::OpenAi, "gpt-4o-mini")
        .with_cost_per_1k(0.002)
        .with_tokens_per_second(50.0)
}

#[test]
fn test_state_transitions() {
    use ProviderState as S;

    assert!(S::Unloaded.can_transition_to(S::Loading));
    assert!(S::Loading.can_transition_to(S::Ready));
    assert!(S::Ready.can_transition_to(S::Busy));
    assert!(S::Busy.can_transition_to(S::Ready));
    assert!(S::Error.can_transition_to(S::Loading));
    assert!(S::Error.can_transition_to(S::Unloaded));

    assert!(!S::Unloaded.can_transition_to(S::Ready));
    assert!(!S::Unloaded.can_transition_to(S::Busy));
    assert!(!S::Loading.can_transition_to(S::Busy));
    assert!(!S::Error.can_transition_to(S::Ready));
}

#[test]
fn test_routable_states() {
    assert!(ProviderState::Ready.is_routable());
    assert!(ProviderState::Busy.is_routable());
    assert!(!ProviderState::Loading.is_routable());
    assert!(!ProviderState::Error.is_routable());
    assert!(!ProviderState::Unloaded.is_routable());
}

#[test]
fn test_illegal_transition_is_ignored() {
    let cell = StatusCell::new();
    assert!(!cell.transition("p", ProviderState::Ready));
    assert_eq!(cell.state(), ProviderState::Unloaded);
}

#[test]
fn test_local_config_ignores_pricing() {
    let config = ProviderConfig::local("local", "llama-3.2-3b")
        .with_cost_per_1k(1.0)
        .with_rate_limit(RateLimit::new(10, 1000));
    assert!(config.is_local());
    assert_eq!(config.cost_per_1k_tokens, 0.0);
    assert!(config.rate_limit.is_none());
    assert_eq!(config.cost_for_tokens(10_000), 0.0);
}

#[test]
fn test_backend_kind_display() {
    assert_eq!(BackendKind::LocalInference.to_string(), "local-inference");
    assert_eq!(
        BackendKind::ExternalApi(Vendor::Groq).to_string(),
        "external-api:groq"
    );
}

#[test]
fn test_rate_limiter_min_interval() {
    let limiter = RateLimiter::new(Some(RateLimit::new(60, 0)));
    assert_eq!(limiter.min_interval(), Some(Duration::from_secs(1)));

    let start = Instant::now();
    assert!(limiter.check_at("p", 10, start).is_ok());

    let err = limiter
        .check_at("p", 10, start + Duration::from_millis(400))
        .unwrap_err();
    match err {
        Error::RateLimit { retry_after_ms, .. } => assert_eq!(retry_after_ms, 600),
        other => panic!("expected rate limit, got {other:?}"),
    }

    assert!(limiter
        .check_at("p", 10, start + Duration::from_millis(1000))
        .is_ok());
}

#[test]
fn test_rate_limiter_token_window() {
    let limiter = RateLimiter::new(Some(RateLimit::new(0, 1000)));
    let start = Instant::now();

    assert!(limiter.check_at("p", 600, start).is_ok());
    assert!(limiter
        .check_at("p", 500, start + Duration::from_secs(1))
        .unwrap_err()
        .is_rate_limit());
    assert!(limiter
        .check_at("p", 400, start + Duration::from_secs(2))
        .is_ok());

    // The first entry has left the window.
    assert!(limiter
        .check_at("p", 500, start + Duration::from_secs(61))
        .is_ok());
}

#[test]
fn test_rate_limiter_admits_oversized_request_into_empty_window() {
    let limiter = RateLimiter::new(Some(RateLimit::new(0, 100)));
    assert!(limiter.check("p", 5000).is_ok());
}

#[test]
fn test_unlimited_rate_limiter() {
    let limiter = RateLimiter::new(None);
    for _ in 0..100 {
        assert!(limiter.check("p", 1_000_000).is_ok());
    }
}

#[tokio::test]
async fn test_initialize_is_idempotent() {
    let provider = MockProvider::new(external("openai"));
    assert_eq!(provider.status().state, ProviderState::Unloaded);

    provider.initialize().await.unwrap();
    assert_eq!(provider.status().state, ProviderState::Ready);

    provider.initialize().await.unwrap();
    assert_eq!(provider.status().state, ProviderState::Ready);
}

#[tokio::test]
async fn test_initialize_failure_marks_error() {
    let provider = MockProvider::new(external("openai")).failing_initialize();
    let err = provider.initialize().await.unwrap_err();
    assert!(matches!(err, Error::Initialization { .. }));

    let status = provider.status();
    assert_eq!(status.state, ProviderState::Error);
    assert!(status.last_error.is_some());
}

#[tokio::test]
async fn test_generate_requires_ready() {
    let provider = MockProvider::new(external("openai"));
    let err = provider
        .generate(&GenerationRequest::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::NotReady {
            state: ProviderState::Unloaded,
            ..
        }
    ));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_generate_returns_to_ready() {
    let provider = MockProvider::new(external("openai"));
    provider.initialize().await.unwrap();
    provider.push_outcome(MockOutcome::Reply("use git reset".to_string()));

    let response = provider
        .generate(&GenerationRequest::new("how do I undo a commit?"))
        .await
        .unwrap();

    assert_eq!(response.content, "use git reset");
    assert_eq!(response.model, "gpt-4o-mini");
    assert!(response.usage.total_tokens > 0);
    assert!(response.cost > 0.0);

    let status = provider.status();
    assert_eq!(status.state, ProviderState::Ready);
    assert_eq!(status.in_flight, 0);
    assert!(status.last_used.is_some());
}

#[tokio::test]
async fn test_busy_while_generating() {
    let provider = Arc::new(
        MockProvider::new(external("openai")).with_latency(Duration::from_millis(100)),
    );
    provider.initialize().await.unwrap();

    let background = Arc::clone(&provider);
    let handle =
        tokio::spawn(async move { background.generate(&GenerationRequest::new("slow")).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(provider.status().state, ProviderState::Busy);
    assert_eq!(provider.status().in_flight, 1);

    handle.await.unwrap().unwrap();
    assert_eq!(provider.status().state, ProviderState::Ready);
}

#[tokio::test]
async fn test_generation_failure_marks_error() {
    let provider = MockProvider::new(external("openai"));
    provider.initialize().await.unwrap();
    provider.push_outcome(MockOutcome::Fail("backend exploded".to_string()));

    let err = provider
        .generate(&GenerationRequest::new("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
    assert_eq!(provider.status().state, ProviderState::Error);

    // Re-initialization recovers the provider.
    provider.initialize().await.unwrap();
    assert_eq!(provider.status().state, ProviderState::Ready);
}

#[tokio::test]
async fn test_rate_limit_rejection_leaves_provider_ready() {
    let config = external("openai").with_rate_limit(RateLimit::new(1, 0));
    let provider = MockProvider::new(config);
    provider.initialize().await.unwrap();

    provider
        .generate(&GenerationRequest::new("first"))
        .await
        .unwrap();
    let err = provider
        .generate(&GenerationRequest::new("second"))
        .await
        .unwrap_err();

    assert!(err.is_rate_limit());
    assert_eq!(provider.status().state, ProviderState::Ready);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_not_ready_rejection_keeps_rate_limit_slot() {
    let config = external("openai").with_rate_limit(RateLimit::new(1, 0));
    let provider = MockProvider::new(config);

    let err = provider
        .generate(&GenerationRequest::new("too early"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotReady { .. }));

    provider.initialize().await.unwrap();
    provider
        .generate(&GenerationRequest::new("first real request"))
        .await
        .unwrap();
    assert_eq!(provider.calls(), 1);
}

#[test]
fn test_rejected_admission_leaves_status() {
    let cell = StatusCell::new();
    cell.transition("p", ProviderState::Loading);
    cell.transition("p", ProviderState::Ready);

    let err = cell
        .begin_request("p", || {
            Err(Error::RateLimit {
                provider: "p".to_string(),
                retry_after_ms: 10,
            })
        })
        .unwrap_err();
    assert!(err.is_rate_limit());
    assert_eq!(cell.state(), ProviderState::Ready);
    assert_eq!(cell.snapshot().in_flight, 0);

    let mut admitted = false;
    let err = StatusCell::new()
        .begin_request("p", || {
            admitted = true;
            Ok(())
        })
        .unwrap_err();
    assert!(matches!(err, Error::NotReady { .. }));
    assert!(!admitted);
}

#[tokio::test]
async fn test_probe_leaves_status_and_rate_limit_alone() {
    let config = external("groq").with_rate_limit(RateLimit::new(1, 0));
    let provider = MockProvider::new(config);
    provider.initialize().await.unwrap();

    provider.push_outcome(MockOutcome::Fail("smoke test failed".to_string()));
    let err = provider
        .probe(&GenerationRequest::new("ping"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Generation(_)));
    assert_eq!(provider.status().state, ProviderState::Ready);
    assert!(provider.status().last_error.is_none());

    for _ in 0..3 {
        provider.probe(&GenerationRequest::new("ping")).await.unwrap();
    }
    assert!(provider.status().last_used.is_none());

    // The limiter never saw the probes.
    provider
        .generate(&GenerationRequest::new("real request"))
        .await
        .unwrap();
    assert_eq!(provider.calls(), 5);
}

#[tokio::test]
async fn test_probe_does_not_initialize() {
    let provider = MockProvider::new(external("openai"));
    let response = provider.probe(&GenerationRequest::new("ping")).await.unwrap();
    assert_eq!(response.content, "mock response");
    assert_eq!(provider.status().state, ProviderState::Unloaded);
}

#[tokio::test]
async fn test_destroy_unloads() {
    let provider = MockProvider::new(external("openai"));
    provider.initialize().await.unwrap();
    provider.destroy().await;
    assert_eq!(provider.status().state, ProviderState::Unloaded);
}

#[test]
fn test_cost_estimate() {
    let provider = MockProvider::new(external("openai"));
    let request = GenerationRequest::new("hello").with_max_tokens(1000);
    let estimate = provider.cost_estimate(&request);
    // At least the max-token share at $0.002 / 1k.
    assert!(estimate >= 0.002);

    let local = MockProvider::new(ProviderConfig::local("local", "llama"));
    assert_eq!(local.cost_estimate(&request), 0.0);
}
