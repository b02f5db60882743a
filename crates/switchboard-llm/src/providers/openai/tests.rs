use super::types::{ChatMessage, ChatRequest, ChatResponse, OpenAiConfig, GROQ_BASE_URL};
use super::OpenAiCompatibleProvider;
use crate::error::Error;
use crate::provider::{BackendKind, Provider, ProviderState, RateLimit, Vendor};
use crate::request::GenerationRequest;
use std::time::Duration;

#[test]
fn test_config_builder() {
    let config = OpenAiConfig::openai(Some("sk-test-key-1234567890".to_string()))
        .with_model("gpt-4o")
        .with_cost_per_1k(0.005)
        .with_rate_limit(RateLimit::new(60, 90_000))
        .with_timeout(Duration::from_secs(10));

    assert_eq!(config.model, "gpt-4o");
    assert_eq!(config.cost_per_1k_tokens, 0.005);
    assert_eq!(config.rate_limit.requests_per_minute, 60);
    assert_eq!(config.timeout, Duration::from_secs(10));
}

#[test]
fn test_groq_defaults() {
    let config = OpenAiConfig::groq(None);
    assert_eq!(config.id, "groq");
    assert_eq!(config.vendor, Vendor::Groq);
    assert_eq!(config.base_url, GROQ_BASE_URL);
}

#[test]
fn test_provider_config() {
    let config = OpenAiConfig::openai(Some("key".to_string())).provider_config();
    assert_eq!(config.kind, BackendKind::ExternalApi(Vendor::OpenAi));
    assert!(config.cost_per_1k_tokens > 0.0);
    assert!(config.rate_limit.is_some());
}

#[test]
fn test_config_debug_masks_key() {
    let config = OpenAiConfig::openai(Some("sk-secret-1234567890abcdef".to_string()));
    let debug = format!("{config:?}");
    assert!(!debug.contains("secret-1234567890"));
    assert!(debug.contains("sk-s...cdef"));

    let unset = format!("{:?}", OpenAiConfig::openai(None));
    assert!(unset.contains("<unset>"));
}

#[tokio::test]
async fn test_unconfigured_provider() {
    let provider = OpenAiCompatibleProvider::new(OpenAiConfig::openai(None)).unwrap();
    assert!(!provider.is_available());

    let err = provider.initialize().await.unwrap_err();
    assert!(matches!(err, Error::Initialization { .. }));
    assert_eq!(provider.status().state, ProviderState::Error);
}

#[tokio::test]
async fn test_initialize_with_key_does_not_touch_network() {
    let config = OpenAiConfig::openai(Some("sk-test".to_string())).with_base_url("http://127.0.0.1:1");
    let provider = OpenAiCompatibleProvider::new(config).unwrap();

    assert!(provider.is_available());
    provider.initialize().await.unwrap();
    assert_eq!(provider.status().state, ProviderState::Ready);
}

#[test]
fn test_cost_estimate_uses_max_tokens() {
    let config = OpenAiConfig::openai(Some("k".to_string())).with_cost_per_1k(0.01);
    let provider = OpenAiCompatibleProvider::new(config).unwrap();

    let small = provider.cost_estimate(&GenerationRequest::new("hi").with_max_tokens(100));
    let large = provider.cost_estimate(&GenerationRequest::new("hi").with_max_tokens(1000));
    assert!(large > small);
    assert!(large >= 0.01);
}

#[test]
fn test_chat_request_serialization() {
    let request = ChatRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![ChatMessage {
            role: "user",
            content: "list files".to_string(),
        }],
        max_tokens: 256,
        temperature: None,
    };
    let json = serde_json::to_value(&request).unwrap();
    assert_eq!(json["messages"][0]["role"], "user");
    assert_eq!(json["max_tokens"], 256);
    assert!(json.get("temperature").is_none());
}

#[test]
fn test_chat_response_parsing() {
    let body = r#"{
        "model": "gpt-4o-mini-2024-07-18",
        "choices": [{"message": {"role": "assistant", "content": "ls -la"}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 10, "completion_tokens": 3, "total_tokens": 13}
    }"#;
    let response: ChatResponse = serde_json::from_str(body).unwrap();
    assert_eq!(response.choices[0].message.content.as_deref(), Some("ls -la"));
    assert_eq!(response.usage.as_ref().map(|u| u.completion_tokens), Some(3));
}
