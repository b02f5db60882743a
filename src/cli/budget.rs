use clap::Args;
use switchboard_core::{Budget, Dispatcher};

#[derive(Args, Debug)]
pub struct BudgetArgs {
    /// Provider id
    pub provider: String,
    /// Daily ceiling (USD)
    #[arg(long)]
    pub daily: Option<f64>,
    /// Weekly ceiling (USD)
    #[arg(long)]
    pub weekly: Option<f64>,
    /// Monthly ceiling (USD)
    #[arg(long)]
    pub monthly: Option<f64>,
    /// Remove the budget
    #[arg(long, conflicts_with_all = ["daily", "weekly", "monthly"])]
    pub clear: bool,
}

impl BudgetArgs {
    fn budget(&self) -> Option<Budget> {
        if self.clear {
            return Some(Budget::default());
        }
        let budget = Budget {
            daily: self.daily,
            weekly: self.weekly,
            monthly: self.monthly,
        };
        (!budget.is_empty()).then_some(budget)
    }
}

pub async fn run(dispatcher: &Dispatcher, args: BudgetArgs) -> anyhow::Result<()> {
    for limit in [args.daily, args.weekly, args.monthly].into_iter().flatten() {
        anyhow::ensure!(
            limit.is_finite() && limit > 0.0,
            "budget limits must be positive, got {limit}"
        );
    }

    if let Some(budget) = args.budget() {
        dispatcher.set_budget(&args.provider, budget).await;
        if budget.is_empty() {
            println!("Budget cleared for {}", args.provider);
        } else {
            println!("Budget updated for {}", args.provider);
        }
    }

    let status = dispatcher.budget_status(&args.provider);
    println!("\n{} spend:", status.provider_id);
    for (label, window) in [
        ("daily", &status.daily),
        ("weekly", &status.weekly),
        ("monthly", &status.monthly),
    ] {
        match window.limit {
            Some(limit) => println!(
                "  {label:<8} ${:.4} / ${limit:.2} ({:.1}%)",
                window.used, window.percentage
            ),
            None => println!("  {label:<8} ${:.4} (no limit)", window.used),
        }
    }
    Ok(())
}
