//! Connectivity tests and benchmarks
//!
//! Diagnostics go through [`Provider::probe`]: they bypass selection, are not
//! recorded as usage and leave provider status and rate limits untouched.

use super::types::{BenchmarkResult, ProviderTestResult, TestOutcome};
use super::Dispatcher;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use switchboard_llm::{GenerationRequest, Provider};
use tracing::{debug, info, warn};

/// Prompt used by [`Dispatcher::test_all_providers`]
pub const TEST_PROMPT: &str = "Reply with the single word OK.";

/// Fixed prompt set used by [`Dispatcher::benchmark_providers`]
pub const BENCHMARK_PROMPTS: [&str; 3] = [
    "List the files in the current directory, largest first.",
    "Explain what `git rebase --onto` does in one paragraph.",
    "Write a shell one-liner that counts lines in all .rs files.",
];

const TEST_MAX_TOKENS: u32 = 8;
const BENCHMARK_MAX_TOKENS: u32 = 128;

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

impl Dispatcher {
    /// Try every provider once and report pass, fail or unavailable
    pub async fn test_all_providers(&self) -> Vec<ProviderTestResult> {
        let tests = self.providers().iter().map(|provider| async move {
            ProviderTestResult {
                provider_id: provider.id().to_string(),
                outcome: test_provider(provider).await,
            }
        });
        let results = join_all(tests).await;

        let passed = results
            .iter()
            .filter(|r| matches!(r.outcome, TestOutcome::Pass { .. }))
            .count();
        info!(total = results.len(), passed, "Provider tests finished");
        results
    }

    /// Run the benchmark prompt set against every routable provider
    pub async fn benchmark_providers(&self) -> Vec<BenchmarkResult> {
        let runs = self
            .providers()
            .iter()
            .filter(|p| p.status().state.is_routable())
            .map(|provider| self.benchmark_provider(provider));
        join_all(runs).await
    }

    async fn benchmark_provider(&self, provider: &Arc<dyn Provider>) -> BenchmarkResult {
        let mut successes = 0u32;
        let mut rate_limited = 0u32;
        let mut total_ms = 0u64;
        let mut total_tokens = 0u64;

        for prompt in BENCHMARK_PROMPTS {
            let mut request = GenerationRequest::new(prompt).with_max_tokens(BENCHMARK_MAX_TOKENS);
            if provider.config().is_local() {
                request = self.optimizer().optimize_request(&request, &provider.config().model);
            }

            let started = Instant::now();
            match provider.probe(&request).await {
                Ok(response) => {
                    successes += 1;
                    total_ms += elapsed_ms(started);
                    total_tokens += u64::from(response.usage.completion_tokens);
                }
                Err(e) if e.is_rate_limit() => {
                    rate_limited += 1;
                    debug!(provider = provider.id(), error = %e, "Benchmark prompt throttled");
                }
                Err(e) => {
                    debug!(provider = provider.id(), error = %e, "Benchmark prompt failed");
                }
            }
        }

        let runs = BENCHMARK_PROMPTS.len() as u32;
        let attempted = runs - rate_limited;
        let average_response_time_ms = if successes > 0 {
            total_ms as f64 / f64::from(successes)
        } else {
            0.0
        };
        let tokens_per_second = if total_ms > 0 {
            total_tokens as f64 / (total_ms as f64 / 1000.0)
        } else {
            0.0
        };
        let reliability = if attempted > 0 {
            f64::from(successes) / f64::from(attempted)
        } else {
            0.0
        };

        let result = BenchmarkResult {
            provider_id: provider.id().to_string(),
            runs,
            successes,
            rate_limited,
            average_response_time_ms,
            tokens_per_second,
            reliability,
        };
        info!(
            provider = %result.provider_id,
            average_ms = result.average_response_time_ms,
            reliability = result.reliability,
            rate_limited = result.rate_limited,
            "Benchmark finished"
        );
        result
    }
}

async fn test_provider(provider: &Arc<dyn Provider>) -> TestOutcome {
    if !provider.is_available() {
        return TestOutcome::Unavailable;
    }

    let request = GenerationRequest::new(TEST_PROMPT).with_max_tokens(TEST_MAX_TOKENS);
    let started = Instant::now();
    match provider.probe(&request).await {
        Ok(_) => TestOutcome::Pass {
            response_time_ms: elapsed_ms(started),
        },
        Err(e) => {
            warn!(provider = provider.id(), error = %e, "Provider test failed");
            TestOutcome::Fail {
                error: e.to_string(),
            }
        }
    }
}
