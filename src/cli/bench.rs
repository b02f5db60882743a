use switchboard_core::dispatcher::BENCHMARK_PROMPTS;
use switchboard_core::Dispatcher;

pub async fn run(dispatcher: &Dispatcher) -> anyhow::Result<()> {
    let ready = dispatcher.initialize().await;
    if ready.is_empty() {
        println!("No ready providers to benchmark.");
        return Ok(());
    }

    println!(
        "Benchmarking {} providers with {} prompts each...\n",
        ready.len(),
        BENCHMARK_PROMPTS.len()
    );
    println!(
        "{:<10} {:>10} {:>10} {:>12} {:>10}",
        "provider", "avg ms", "tok/s", "reliability", "throttled"
    );
    for result in dispatcher.benchmark_providers().await {
        println!(
            "{:<10} {:>10.0} {:>10.1} {:>11.0}% {:>10}",
            result.provider_id,
            result.average_response_time_ms,
            result.tokens_per_second,
            result.reliability * 100.0,
            result.rate_limited
        );
    }
    Ok(())
}
