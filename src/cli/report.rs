use clap::Args;
use switchboard_core::{format_report, Dispatcher, UsagePeriod};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// today, week, month or all
    #[arg(long, default_value = "today")]
    pub period: UsagePeriod,
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(dispatcher: &Dispatcher, args: ReportArgs) -> anyhow::Result<()> {
    let report = dispatcher.usage_report(args.period);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report));
    }
    Ok(())
}
