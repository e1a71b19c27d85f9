//! Pennywise main entry point

use anyhow::Context;
use clap::Parser;
use pennywise_api::start_server;
use pennywise_config::{Config, ConfigError};
use pennywise_core::{DocumentStore, MemoryStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Runtime;

#[derive(Parser, Debug)]
#[command(name = "pennywise")]
#[command(version = "0.1.0")]
#[command(about = "Personal income and expense tracker with live statistics", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print the default configuration and exit
    #[arg(long)]
    print_default_config: bool,
}

/// Missing config file falls back to defaults; anything else is fatal
fn load_config(path: &Path) -> Result<(Config, Option<ConfigError>), ConfigError> {
    match Config::load(path) {
        Ok(config) => Ok((config, None)),
        Err(e @ ConfigError::FileNotFound { .. }) => Ok((Config::default(), Some(e))),
        Err(e) => Err(e),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", Config::generate_default());
        return Ok(());
    }

    let (config, fallback) = load_config(&args.config)
        .map_err(|e| anyhow::anyhow!("{}", e.to_details()))
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();

    match fallback {
        Some(e) => log::warn!("{}; using default configuration", e),
        None => log::info!("Config loaded from {}", args.config.display()),
    }

    let rt = Runtime::new()?;
    rt.block_on(async {
        let store = if config.data.persist {
            let path = config.snapshot_path();
            log::info!("Using snapshot file {}", path.display());
            MemoryStore::open(&path)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e.to_details()))?
        } else {
            log::info!("Persistence disabled, data lives in memory only");
            MemoryStore::new()
        };
        let store: Arc<dyn DocumentStore> = Arc::new(store);

        start_server(config, store).await?;
        Ok::<(), anyhow::Error>(())
    })
}
