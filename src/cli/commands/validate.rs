//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::AppConfig;

/// Print the effective settings. Loading already validated them.
pub fn run(config_path: Option<&Path>, config: &AppConfig) -> Result<()> {
    match config_path {
        Some(path) => println!("Configuration is valid: {}", path.display()),
        None => println!("Configuration is valid (defaults and environment only)"),
    }
    println!();

    let backtest = config.to_backtest_config();
    println!("App:              {} ({})", config.app.name, config.app.environment);
    println!("Log level:        {} ({})", config.logging.level, config.logging.format);
    println!(
        "Data:             {} from {} [{}]",
        config.data.source,
        config.data.path.display(),
        config.data.timeframe
    );
    if config.data.cache_enabled {
        println!(
            "Cache:            {} ({} days)",
            config.data.cache_dir.display(),
            config.data.cache_expiration_days
        );
    } else {
        println!("Cache:            disabled");
    }
    println!("Initial capital:  {}", backtest.initial_capital);
    println!("Position sizing:  {:?}", backtest.position_sizing);
    println!("Commission:       {} + {}%", backtest.commission.fixed, backtest.commission.percent);
    println!("Slippage:         {:?}", backtest.slippage);
    println!("Stop loss:        {:?}", backtest.risk.stop_loss);
    match backtest.risk.max_drawdown_pct {
        Some(max) => println!("Max drawdown:     {}%", max),
        None => println!("Max drawdown:     none"),
    }
    Ok(())
}
