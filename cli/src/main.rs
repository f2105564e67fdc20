//! CLI entrypoint for ensemble
//!
//! Wires configuration, provider gateways, stores, and the orchestrator
//! together, then runs one turn — buffered by default, or as one JSON
//! event per line with `--stream`.

use anyhow::{Result, bail};
use clap::Parser;
use ensemble_application::{
    AnalyzerConfig, BrainSelector, CollaborationExecutor, DecisionStore, ExecutionOptions,
    MemoryStore, Orchestrator, ProviderRegistry, StrategyAnalyzer, TurnRequest,
};
use ensemble_infrastructure::{
    ConfigLoader, InMemoryDecisionStore, InMemoryMemoryStore, JsonlDecisionStore, NoopToolRunner,
    build_gateways,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ensemble", version, about = "Route one request across a team of LLM providers")]
struct Cli {
    /// The user message to route and answer
    message: Option<String>,

    /// Path to a config file (overrides discovered configs)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip config discovery, use built-in defaults
    #[arg(long)]
    no_config: bool,

    /// Emit the turn as streaming JSON events, one per line
    #[arg(long)]
    stream: bool,

    /// Print the full buffered result as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// User id for conversation history and memory
    #[arg(long, default_value = "local")]
    user: String,

    /// Session id; a fresh one is generated when omitted
    #[arg(long)]
    session: Option<String>,

    /// Persona line for the agents' system prompt
    #[arg(long)]
    persona: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let Some(message) = cli.message else {
        bail!("A message is required. Try: ensemble \"your question\"");
    };

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?
    };
    if config.providers.is_empty() {
        bail!("No providers configured. Add [[providers]] entries to ensemble.toml.");
    }

    // === Dependency injection ===
    let registry = Arc::new(ProviderRegistry::new(build_gateways(&config)));
    info!("Configured {} providers", registry.len());

    let brain = Arc::new(BrainSelector::new(
        Arc::clone(&registry),
        Duration::from_secs(config.engine.health_ttl_secs),
    ));

    let decisions: Arc<dyn DecisionStore> = match &config.storage.decision_log {
        Some(path) => Arc::new(JsonlDecisionStore::open(path)?),
        None => Arc::new(InMemoryDecisionStore::new()),
    };
    let memory: Arc<dyn MemoryStore> = Arc::new(InMemoryMemoryStore::new());

    let analyzer = Arc::new(StrategyAnalyzer::new(
        Arc::clone(&registry),
        Arc::clone(&brain),
        Arc::clone(&decisions),
        Arc::clone(&memory),
        AnalyzerConfig {
            context_window: config.engine.context_window,
            similar_limit: config.engine.similar_limit,
            min_overlap: config.engine.min_overlap,
            ..AnalyzerConfig::default()
        },
    ));
    let executor = CollaborationExecutor::new(registry, brain, Arc::new(NoopToolRunner));
    let orchestrator = Orchestrator::new(analyzer, executor, decisions, memory);

    let session = cli
        .session
        .unwrap_or_else(|| format!("s-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")));
    let mut request = TurnRequest::new(cli.user, session, message);
    if let Some(persona) = cli.persona.or_else(|| config.engine.persona.clone()) {
        request = request.with_persona(persona);
    }

    let options = ExecutionOptions {
        timeout: match config.engine.call_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        },
        ..Default::default()
    };

    if cli.stream {
        let mut events = orchestrator.stream_turn(request, options);
        while let Some(event) = events.recv().await {
            println!("{}", serde_json::to_string(&event)?);
        }
        return Ok(());
    }

    let result = orchestrator.run_turn(&request, &options).await?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.content);
    }

    Ok(())
}
