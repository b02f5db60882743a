use anyhow::Context;
use clap::Args;
use switchboard_core::{CriteriaOverrides, Dispatcher};
use switchboard_llm::{GenerationRequest, RequestContext};

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Prompt text
    #[arg(required = true)]
    pub prompt: Vec<String>,
    /// Use this provider if it is ready
    #[arg(long)]
    pub provider: Option<String>,
    /// Prioritize response time
    #[arg(long)]
    pub speed: bool,
    /// Prioritize cost
    #[arg(long)]
    pub cost: bool,
    /// Prioritize model quality
    #[arg(long)]
    pub quality: bool,
    /// Only use on-device providers
    #[arg(long)]
    pub local: bool,
    /// Do not retry on another provider
    #[arg(long)]
    pub no_fallback: bool,
    /// Skip providers whose estimate exceeds this (USD)
    #[arg(long)]
    pub max_cost: Option<f64>,
    /// Maximum tokens to generate
    #[arg(long)]
    pub max_tokens: Option<u32>,
    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,
    /// Print routing metadata as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskArgs {
    /// Explicit flags replace the configured weighting; absent flags keep it
    fn overrides(&self) -> CriteriaOverrides {
        let weighted = self.speed || self.cost || self.quality;
        CriteriaOverrides {
            prioritize_speed: weighted.then_some(self.speed),
            prioritize_cost: weighted.then_some(self.cost),
            prioritize_quality: weighted.then_some(self.quality),
            max_cost_per_request: self.max_cost,
            require_local: self.local.then_some(true),
            allow_fallback: self.no_fallback.then_some(false),
            ..Default::default()
        }
    }

    fn request(&self) -> GenerationRequest {
        let mut request =
            GenerationRequest::new(self.prompt.join(" ")).with_context(shell_context());
        if let Some(provider) = &self.provider {
            request = request.with_provider(provider.clone());
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }
}

fn shell_context() -> RequestContext {
    RequestContext {
        working_directory: std::env::current_dir()
            .ok()
            .map(|dir| dir.display().to_string()),
        shell: std::env::var("SHELL").ok(),
        ..Default::default()
    }
}

pub async fn run(dispatcher: &Dispatcher, args: AskArgs) -> anyhow::Result<()> {
    dispatcher.initialize().await;

    let routed = dispatcher
        .generate_response(&args.request(), &args.overrides())
        .await
        .context("Request failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&routed)?);
        return Ok(());
    }

    println!("{}", routed.response.content.trim_end());
    eprintln!(
        "\n[{} · {} · {}ms · {} tokens · ${:.4}{}]",
        routed.metadata.provider_id,
        routed.metadata.selection_reason,
        routed.metadata.response_time_ms,
        routed.response.usage.total_tokens,
        routed.response.cost,
        if routed.metadata.fallback_used { " · fallback" } else { "" },
    );
    Ok(())
}
