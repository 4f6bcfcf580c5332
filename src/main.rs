//! RepQuest - Drill Tracking for Youth Sports Teams
//!
//! Command line entry point for managing players and drills, logging
//! completions and rechecking badges.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    let config = repquest::storage::config::load_config()?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting RepQuest v{}", env!("CARGO_PKG_VERSION"));

    cli::run(cli, config)
}
