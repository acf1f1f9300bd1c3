use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use threadwatch_analyzer::{PortfolioRunner, ThreadAnalyzer};
use threadwatch_cli::{
    config::{Config, LoggingConfig},
    input,
};
use threadwatch_llm::{ClientFactory, ModelGateway};
use threadwatch_persist::{DocumentStoreBuilder, PersistenceClient};

#[derive(Parser)]
#[command(
    name = "threadwatch",
    version,
    about = "Surface unresolved actions and emerging risks from project email threads"
)]
struct Cli {
    /// Directory holding default.toml and {ENV}.toml
    #[arg(long, default_value = "config")]
    config_dir: PathBuf,
    /// Email threads JSON (overrides paths.threads)
    #[arg(long)]
    threads: Option<PathBuf>,
    /// Colleague roster JSON (overrides paths.roster)
    #[arg(long)]
    roster: Option<PathBuf>,
    /// Where to write the run report (overrides paths.output)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Document store file (overrides paths.store)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Clear the store before analyzing
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = Config::load(&cli.config_dir)
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config.logging);

    let threads_path = cli.threads.unwrap_or_else(|| config.paths.threads.clone());
    let roster_path = cli.roster.or_else(|| config.paths.roster.clone());
    let output_path = cli.output.unwrap_or_else(|| config.paths.output.clone());
    let store_path = cli.store.unwrap_or_else(|| config.paths.store.clone());

    tracing::info!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        requests_per_minute = config.rate.requests_per_minute,
        tokens_per_minute = config.rate.tokens_per_minute,
        "Starting threadwatch"
    );

    let threads = input::load_threads(&threads_path).await?;
    let colleagues = match &roster_path {
        Some(path) => input::load_roster(path).await?,
        None => Vec::new(),
    };

    let provider = config
        .provider_config()
        .map_err(|e| anyhow::anyhow!("Failed to configure model provider: {}", e))?;
    let client = ClientFactory::create_chat_client(provider)?;
    let gateway = Arc::new(ModelGateway::new(client, config.gateway_config()));

    let store = Arc::new(
        DocumentStoreBuilder::new()
            .path(&store_path)
            .reset(cli.reset)
            .build()
            .await
            .with_context(|| format!("Failed to open store {}", store_path.display()))?,
    );
    tracing::info!(path = %store_path.display(), reset = cli.reset, "Store opened");

    let analyzer = ThreadAnalyzer::builder()
        .gateway(gateway)
        .store(store.clone())
        .colleagues(colleagues)
        .config(config.analyzer.clone())
        .build()?;

    let report = PortfolioRunner::new(analyzer).run(&threads).await?;

    input::write_json(&output_path, &report).await?;
    tracing::info!(path = %output_path.display(), "Report written");

    let gateway_stats = &report.gateway_stats;
    tracing::info!(
        requests = gateway_stats.total_requests,
        tokens = gateway_stats.total_tokens,
        cost_usd = gateway_stats.estimated_cost_usd,
        failed_calls = gateway_stats.failed_calls,
        "Model usage"
    );

    let stats = store.get_statistics().await?;
    tracing::info!(
        total_issues = stats.total_issues,
        open = stats.open_issues,
        resolved = stats.resolved_issues,
        threads = stats.total_threads,
        projects = stats.total_projects,
        avg_priority_open = stats.avg_priority_open,
        runs = stats.total_analysis_runs,
        "Store statistics"
    );

    Ok(())
}

fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
