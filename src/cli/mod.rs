//! CLI module for Switchboard
//!
//! Provides commands:
//! - `ask`: route a prompt to the best provider
//! - `status`: provider status and usage
//! - `test`: connectivity test for every provider
//! - `bench`: latency/throughput benchmark
//! - `report`: usage report for a period
//! - `budget`: show or set a provider's budget

use anyhow::Context;
use clap::{Parser, Subcommand};
use switchboard_core::Dispatcher;
use tracing::debug;

pub mod ask;
pub mod bench;
pub mod budget;
pub mod report;
pub mod status;
pub mod test;

/// Switchboard CLI
#[derive(Parser, Debug)]
#[command(name = "switchboard")]
#[command(about = "Multi-backend AI request router")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route a prompt to the best available provider
    Ask(ask::AskArgs),
    /// Show provider status and usage
    Status,
    /// Send a minimal request to every provider
    Test,
    /// Benchmark every ready provider
    Bench,
    /// Usage report
    Report(report::ReportArgs),
    /// Show or set a provider budget
    Budget(budget::BudgetArgs),
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let settings = crate::loader::load_config()?;
    debug!(criteria = ?settings.criteria, "Loaded configuration");
    let dispatcher = Dispatcher::from_settings(&settings)
        .await
        .context("Failed to build router")?;

    let result = match command {
        Commands::Ask(args) => ask::run(&dispatcher, args).await,
        Commands::Status => status::run(&dispatcher).await,
        Commands::Test => test::run(&dispatcher).await,
        Commands::Bench => bench::run(&dispatcher).await,
        Commands::Report(args) => report::run(&dispatcher, args),
        Commands::Budget(args) => budget::run(&dispatcher, args).await,
    };

    dispatcher.shutdown().await;
    result
}
