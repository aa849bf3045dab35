//! Backtester CLI application.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, DEFAULT_CONFIG};
use std::path::PathBuf;
use trading_config::load_config;
use trading_monitor::{setup_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path: Option<PathBuf> = cli
        .config
        .clone()
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()));
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;

    // Setup logging
    let level = cli
        .log_level
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| config.logging.level.clone());
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        config.logging.format.parse()?
    };
    let _guard = setup_logging(&level, format, config.logging.file.as_deref())?;

    // Execute command
    match cli.command {
        Commands::Backtest(args) => cli::commands::backtest::run(args, config).await,
        Commands::Strategies => cli::commands::strategies::run(),
        Commands::ValidateConfig => {
            cli::commands::validate::run(config_path.as_deref(), &config)
        }
    }
}
