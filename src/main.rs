//! Resume-Harvester main entry point
//!
//! This is the command-line interface for the GitHub resume collector.

use anyhow::Context;
use clap::Parser;
use resume_harvester::config::{discover_config_path, resolve_config};
use resume_harvester::output::print_summary;
use resume_harvester::{Collector, HarvestError, TOKEN_ENV};
use tracing_subscriber::EnvFilter;

/// Resume-Harvester: a rate-limit-aware GitHub profile collector
///
/// Searches GitHub users, classifies their public profiles into resume
/// records, and writes checkpointed JSON batches. Interrupted runs resume
/// from the checkpoint. Requires GITHUB_TOKEN in the environment; optional
/// settings are read from collector.toml or RESUME_HARVESTER_CONFIG.
#[derive(Parser, Debug)]
#[command(name = "resume-harvester")]
#[command(version)]
#[command(about = "A rate-limit-aware GitHub resume collector", long_about = None)]
struct Cli {
    /// Total resumes to collect, counting earlier runs
    #[arg(value_name = "TARGET", default_value_t = 1000)]
    target: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging();

    // Credential check comes before any file or network access
    let token = match std::env::var(TOKEN_ENV) {
        Ok(token) if !token.trim().is_empty() => token,
        _ => {
            tracing::error!("{} environment variable not set", TOKEN_ENV);
            return Err(HarvestError::MissingCredential { var: TOKEN_ENV }.into());
        }
    };

    let config_path = discover_config_path();
    match &config_path {
        Some(path) => tracing::info!("Loading configuration from: {}", path.display()),
        None => tracing::info!("No configuration file found, using defaults"),
    }
    let (config, config_hash) =
        resolve_config(config_path.as_deref()).context("failed to load configuration")?;
    if let Some(hash) = &config_hash {
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    let mut collector = Collector::new(config, &token)
        .context("failed to initialize collector")?
        .with_config_hash(config_hash);

    match collector.run(u64::from(cli.target)).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Collection failed: {}", e);
            Err(e.into())
        }
    }
}

/// Sets up the tracing subscriber, honoring RUST_LOG when set
fn setup_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("resume_harvester=info,warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
