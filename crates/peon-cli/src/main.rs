mod configuration;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use configuration::Settings;
use peon::agent::{Agent, AgentConfig, RunOutcome, RunStatus};
use peon::prompt_template::system_prompt;
use peon::providers::factory::get_provider;
use peon::registry::ToolRegistry;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// What you want the agent to do
    prompt: String,

    /// Log every round-trip and print token totals
    #[arg(short, long)]
    verbose: bool,

    /// Backend that answers the conversation
    #[arg(long, value_enum, default_value = "gemini")]
    backend: Backend,

    /// Directory every tool is confined to
    #[arg(short, long, default_value = "./calculator")]
    working_directory: PathBuf,

    /// Maximum number of round-trips (defaults to MAX_STEPS or 20)
    #[arg(long)]
    max_steps: Option<usize>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Backend {
    Gemini,
    Ollama,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::new().context("Failed to load configuration")?;
    let provider_config = match cli.backend {
        Backend::Gemini => settings
            .gemini_config()
            .context("The gemini backend needs GEMINI_API_KEY")?,
        Backend::Ollama => settings.ollama_config(),
    };
    let provider = get_provider(provider_config).context("Failed to create provider")?;

    anyhow::ensure!(
        cli.working_directory.is_dir(),
        "Working directory {} does not exist",
        cli.working_directory.display()
    );
    let registry = ToolRegistry::with_builtins(&cli.working_directory);

    let mut config = AgentConfig {
        max_steps: cli.max_steps.unwrap_or(settings.max_steps),
        ..Default::default()
    };
    config.system_prompt = Some(match settings.system_prompt {
        Some(prompt) => prompt,
        None => system_prompt(registry.tools(), &config.done_phrase)
            .context("Failed to render system prompt")?,
    });

    let agent = Agent::new(Arc::from(provider), Arc::new(registry), config);
    let outcome = agent.run(&cli.prompt).await?;
    print_outcome(&outcome, cli.verbose);

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "peon=info,warn" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_outcome(outcome: &RunOutcome, verbose: bool) {
    if verbose {
        let status = match outcome.status {
            RunStatus::Done => style("done").green(),
            RunStatus::StepBudgetExhausted => style("step budget exhausted").yellow(),
        };
        println!(
            "{} after {} steps; total input tokens: {}; total output tokens: {}",
            status, outcome.steps, outcome.usage.input_tokens, outcome.usage.output_tokens
        );
    }
    println!("{}", style("Final Response:").bold());
    println!("{}", outcome.text);
}
