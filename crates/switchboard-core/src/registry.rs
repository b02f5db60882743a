//! Provider registry construction
//!
//! Builds the closed set of backends in a fixed order: local, groq, openai,
//! anthropic. Backends are registered whether or not their credentials are
//! present; `is_available()` decides later whether they get initialized.

use crate::config::{LocalSettings, ProvidersSettings, RemoteSettings};
use std::sync::Arc;
use std::time::Duration;
use switchboard_llm::{
    AnthropicConfig, AnthropicProvider, LocalConfig, LocalInferenceProvider,
    OpenAiCompatibleProvider, OpenAiConfig, Provider,
};
use tracing::{debug, info, warn};

/// Build every enabled backend
#[must_use]
pub fn build_providers(settings: &ProvidersSettings) -> Vec<Arc<dyn Provider>> {
    let mut providers: Vec<Arc<dyn Provider>> = Vec::new();

    if settings.local.enabled {
        match LocalInferenceProvider::new(local_config(&settings.local)) {
            Ok(provider) => register(&mut providers, Arc::new(provider)),
            Err(e) => warn!(provider = "local", error = %e, "Failed to create provider"),
        }
    } else {
        debug!(provider = "local", "Provider disabled");
    }

    for (name, remote, base) in [
        ("groq", &settings.groq, OpenAiConfig::groq_from_env as fn() -> OpenAiConfig),
        ("openai", &settings.openai, OpenAiConfig::openai_from_env),
    ] {
        if !remote.enabled {
            debug!(provider = name, "Provider disabled");
            continue;
        }
        match OpenAiCompatibleProvider::new(openai_config(base(), remote)) {
            Ok(provider) => register(&mut providers, Arc::new(provider)),
            Err(e) => warn!(provider = name, error = %e, "Failed to create provider"),
        }
    }

    if settings.anthropic.enabled {
        match AnthropicProvider::new(anthropic_config(&settings.anthropic)) {
            Ok(provider) => register(&mut providers, Arc::new(provider)),
            Err(e) => warn!(provider = "anthropic", error = %e, "Failed to create provider"),
        }
    } else {
        debug!(provider = "anthropic", "Provider disabled");
    }

    info!(count = providers.len(), "Provider registry built");
    providers
}

fn register(providers: &mut Vec<Arc<dyn Provider>>, provider: Arc<dyn Provider>) {
    info!(
        provider = provider.id(),
        model = %provider.config().model,
        available = provider.is_available(),
        "Registered provider"
    );
    providers.push(provider);
}

fn local_config(settings: &LocalSettings) -> LocalConfig {
    let mut config = LocalConfig::from_env();
    if let Some(path) = &settings.model_path {
        config.model_path = Some(path.clone());
    }
    if let Some(model) = &settings.model {
        config = config.with_model(model.clone());
    }
    if let Some(url) = &settings.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(tps) = settings.tokens_per_second {
        config = config.with_tokens_per_second(tps);
    }
    if let Some(secs) = settings.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}

fn openai_config(mut config: OpenAiConfig, settings: &RemoteSettings) -> OpenAiConfig {
    if let Some(model) = &settings.model {
        config = config.with_model(model.clone());
    }
    if let Some(url) = &settings.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(cost) = settings.cost_per_1k_tokens {
        config = config.with_cost_per_1k(cost);
    }
    if let Some(rate_limit) = settings.rate_limit {
        config = config.with_rate_limit(rate_limit);
    }
    if let Some(secs) = settings.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}

fn anthropic_config(settings: &RemoteSettings) -> AnthropicConfig {
    let mut config = AnthropicConfig::from_env();
    if let Some(model) = &settings.model {
        config = config.with_model(model.clone());
    }
    if let Some(url) = &settings.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(cost) = settings.cost_per_1k_tokens {
        config = config.with_cost_per_1k(cost);
    }
    if let Some(rate_limit) = settings.rate_limit {
        config = config.with_rate_limit(rate_limit);
    }
    if let Some(secs) = settings.timeout_secs {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    config
}
