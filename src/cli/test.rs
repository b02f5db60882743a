use switchboard_core::{Dispatcher, TestOutcome};

pub async fn run(dispatcher: &Dispatcher) -> anyhow::Result<()> {
    println!("Testing providers...\n");

    let results = dispatcher.test_all_providers().await;
    for result in &results {
        match &result.outcome {
            TestOutcome::Pass { response_time_ms } => {
                println!("✅ {:<10} pass ({response_time_ms}ms)", result.provider_id);
            }
            TestOutcome::Fail { error } => {
                println!("❌ {:<10} fail: {error}", result.provider_id);
            }
            TestOutcome::Unavailable => {
                println!("⚪ {:<10} unavailable", result.provider_id);
            }
        }
    }

    let passed = results
        .iter()
        .filter(|r| matches!(r.outcome, TestOutcome::Pass { .. }))
        .count();
    println!("\n{passed}/{} providers passed", results.len());
    Ok(())
}
