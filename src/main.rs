use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use samarth::datasets::sample_data::seed_cache;
use samarth::utils::ensure_directory;
use samarth::{Config, ConfigError, DatasetCache, DatasetRegistry, QueryError, QueryService};
use time::format_description::well_known::Rfc3339;
use tracing::info;

/// samarth - questions over Indian agricultural and climate data
#[derive(Parser)]
#[command(name = "samarth")]
#[command(about = "Answer questions about Indian agriculture and rainfall from data.gov.in datasets")]
#[command(version)]
struct Cli {
    /// Directory holding cached dataset snapshots
    #[arg(long, global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve(ServeCommand),
    /// Answer a single question and print the result
    Ask(AskCommand),
    /// List the known datasets and their cache status
    Datasets,
    /// Write the bundled sample datasets into the cache
    Seed,
}

#[derive(Parser)]
struct ServeCommand {
    /// Port to listen on (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Parser)]
struct AskCommand {
    /// The question to answer
    #[arg(value_name = "QUESTION")]
    question: String,
}

fn main() {
    let cli = Cli::parse();

    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let result = load_config(cli.cache_dir).and_then(|config| {
        samarth::telemetry::init_tracing(config.debug);
        match &cli.command {
            Commands::Serve(cmd) => handle_serve(cmd, config),
            Commands::Ask(cmd) => handle_ask(cmd, &config),
            Commands::Datasets => handle_datasets(&config),
            Commands::Seed => handle_seed(&config),
        }
    });

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are blank questions and malformed configuration values.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.downcast_ref::<QueryError>().is_some() || error.downcast_ref::<ConfigError>().is_some()
}

fn load_config(cache_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = Config::from_env()?;
    if let Some(dir) = cache_dir {
        config.cache_dir = dir;
    }
    Ok(config)
}

fn handle_serve(cmd: &ServeCommand, mut config: Config) -> Result<()> {
    if let Some(port) = cmd.port {
        config.port = port;
    }
    ensure_directory(&config.cache_dir)?;

    let service = Arc::new(QueryService::from_config(&config)?);
    info!(
        provider = %config.llm_provider,
        model = config.llm_model(),
        cache_dir = %config.cache_dir.display(),
        "starting Project Samarth API"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(samarth::server::serve(service, config.port))
}

fn handle_ask(cmd: &AskCommand, config: &Config) -> Result<()> {
    if cmd.question.trim().is_empty() {
        return Err(QueryError::EmptyQuestion.into());
    }

    let service = QueryService::from_config(config)?;
    let response = service.ask(&cmd.question)?;

    println!("{}", response.answer);

    if !response.citations.is_empty() {
        println!();
        println!("Sources:");
        for citation in &response.citations {
            println!(
                "  - {} ({} records): {}",
                citation.dataset, citation.records, citation.url
            );
        }
    }

    println!();
    println!("Query plan:");
    println!(
        "{}",
        serde_json::to_string_pretty(&response.query_plan).context("Failed to render query plan")?
    );

    Ok(())
}

fn handle_datasets(config: &Config) -> Result<()> {
    let cache = DatasetCache::new(config.cache_dir.clone(), config.cache_expiry);

    for listing in DatasetRegistry::builtin().list_available_datasets() {
        let cached = match cache.cached_at(listing.key) {
            Some(at) => format!("cached {}", at.format(&Rfc3339)?),
            None => "not cached".to_string(),
        };
        println!("{} - {} [{}]", listing.key, listing.description, cached);
        println!("    {}", listing.url);
    }

    Ok(())
}

fn handle_seed(config: &Config) -> Result<()> {
    ensure_directory(&config.cache_dir)?;
    let cache = DatasetCache::new(config.cache_dir.clone(), config.cache_expiry);

    let seeded = seed_cache(&cache).context("Failed to write sample datasets")?;
    for (key, rows) in seeded {
        println!("Seeded {key} ({rows} records)");
    }
    println!("Sample data written to {}", config.cache_dir.display());

    Ok(())
}
