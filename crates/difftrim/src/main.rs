mod cli;
mod commands;
mod error;
mod summarizer;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use difftrim_core::{logging, Config};
use std::path::Path;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let (config, warnings) = Config::load(cli.config.as_deref().map(Path::new))
        .context("Failed to load configuration")?;

    let mut log_config = config.log();
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    let _guard = logging::init(&log_config).context("Failed to initialize logging")?;

    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    commands::execute(cli.command, config).await
}
