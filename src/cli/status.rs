use switchboard_core::Dispatcher;

pub async fn run(dispatcher: &Dispatcher) -> anyhow::Result<()> {
    dispatcher.initialize().await;

    println!("Switchboard providers\n");
    let rows = dispatcher.status();
    if rows.is_empty() {
        println!("  No providers registered. Check config/default.toml.");
        return Ok(());
    }

    for row in rows {
        let icon = match (row.available, row.status.state.is_routable()) {
            (false, _) => "⚪",
            (true, true) => "✅",
            (true, false) => "❌",
        };
        println!(
            "{icon} {:<10} {:<28} {:<24} {}",
            row.provider_id, row.model, row.backend, row.status.state
        );
        if !row.available {
            println!("     not configured");
        }
        if let Some(error) = &row.status.last_error {
            println!("     last error: {error}");
        }
        if let Some(metrics) = &row.metrics {
            println!(
                "     {} requests, {:.1}% errors, avg {:.0}ms, ${:.4} total",
                metrics.total_requests,
                metrics.error_rate * 100.0,
                metrics.average_response_time_ms,
                metrics.total_cost
            );
        }
        for (label, window) in [
            ("daily", &row.budget.daily),
            ("weekly", &row.budget.weekly),
            ("monthly", &row.budget.monthly),
        ] {
            if let Some(limit) = window.limit {
                let warn = if window.is_alerting() { " ⚠️" } else { "" };
                println!(
                    "     {label} budget: ${:.2} / ${:.2} ({:.0}%){warn}",
                    window.used, limit, window.percentage
                );
            }
        }
    }
    Ok(())
}
