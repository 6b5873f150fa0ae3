use std::time::Instant;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use owo_colors::OwoColorize;
use pocketshot_core::{Config, Credentials, generate_snapshot};
use pocketshot_server::ServerConfig;
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_LOG_FILTER: &str = "pocketshot=info,pocketshot_core=info,pocketshot_server=info,tower_http=info";

/// What to do after loading configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Retrieve, enrich and write the snapshot once, then exit
    Get,
    /// Serve the snapshot and image cache over HTTP
    Serve,
}

/// Republish your saved Pocket items with a representative image for each
#[derive(Parser, Debug)]
#[command(name = "pocketshot")]
#[command(version)]
#[command(about = "Republish saved Pocket items with images", long_about = None)]
struct Args {
    /// Run mode
    #[arg(value_enum, default_value_t = Mode::Serve, value_name = "MODE")]
    mode: Mode,
}

fn init_logging(config: &Config) {
    if !config.logging {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

async fn get(config: &Config) -> anyhow::Result<()> {
    let credentials = Credentials::from_env().context("Cannot retrieve saved items")?;

    if config.logging {
        echo::print_banner();
        echo::print_step(1, 2, "Retrieving and enriching saved items");
        if !config.generate_images {
            echo::print_info("Image generation disabled; only cached images are published");
        }
    }

    let started = Instant::now();
    let batch = generate_snapshot(config, credentials)
        .await
        .context("Failed to generate snapshot")?;

    if config.logging {
        echo::print_step(2, 2, "Snapshot written");
        echo::print_batch_summary(&batch.stats);
        echo::print_timing("Run", started.elapsed());
        echo::print_success(&format!(
            "{} items written to {}",
            batch.items.len(),
            config.snapshot_path().display().bright_white()
        ));
        if batch.stats.failed > 0 {
            echo::print_warning(&format!("{} items have no image yet; they are retried next run", batch.stats.failed));
        }
    }

    Ok(())
}

async fn serve(config: &Config) -> anyhow::Result<()> {
    if config.logging {
        echo::print_banner();
        echo::print_info(&format!("Starting server at http://{}", config.listen_addr));
    }

    pocketshot_server::serve(ServerConfig::from(config))
        .await
        .with_context(|| format!("Failed to serve on {}", config.listen_addr))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _ = dotenvy::dotenv();
    let config = Config::from_env().context("Invalid configuration")?;
    init_logging(&config);

    match args.mode {
        Mode::Get => get(&config).await,
        Mode::Serve => serve(&config).await,
    }
}
