//! Configuration management.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `TRADING__SECTION__KEY` environment variables. Everything is read once,
//! validated, and handed to the engine as an immutable `BacktestConfig`.

mod settings;

pub use settings::{
    AppConfig, AppSettings, BacktestSettings, DataSettings, ExportFormat, LoggingConfig,
    OutputFormat, OutputSettings,
};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use trading_core::error::{TradingError, TradingResult};
use trading_strategies::StrategySpec;

/// Load configuration from an optional file and the environment, then validate.
pub fn load_config(path: Option<&Path>) -> TradingResult<AppConfig> {
    let mut builder = Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
    }

    let config: AppConfig = builder
        .add_source(
            Environment::with_prefix("TRADING")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(|c| c.try_deserialize())
        .map_err(|e| TradingError::Config(e.to_string()))?;

    config.validate()?;
    Ok(config)
}

#[derive(Debug, Deserialize)]
struct StrategyFile {
    #[serde(rename = "strategy", default)]
    strategies: Vec<StrategySpec>,
}

/// Parse a list of strategies from TOML `[[strategy]]` tables.
pub fn parse_strategies(content: &str) -> TradingResult<Vec<StrategySpec>> {
    let file: StrategyFile =
        toml::from_str(content).map_err(|e| TradingError::Config(e.to_string()))?;
    for spec in &file.strategies {
        spec.validate()?;
    }
    Ok(file.strategies)
}

/// Read and validate a strategy list file.
pub fn load_strategies(path: &Path) -> TradingResult<Vec<StrategySpec>> {
    let content = std::fs::read_to_string(path)?;
    parse_strategies(&content)
}
