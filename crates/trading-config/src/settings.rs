//! Configuration structures.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use trading_backtest::{BacktestConfig, CommissionModel, SlippageModel};
use trading_core::error::{TradingError, TradingResult};
use trading_core::types::Timeframe;
use trading_risk::{PositionSizingMethod, RiskConfig};

/// Main application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub backtest: BacktestSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl AppConfig {
    /// Reject settings a run could not start with.
    pub fn validate(&self) -> TradingResult<()> {
        self.logging.validate()?;
        self.data.validate()?;
        self.to_backtest_config().validate()
    }

    /// Engine configuration for one run.
    pub fn to_backtest_config(&self) -> BacktestConfig {
        let b = &self.backtest;
        BacktestConfig {
            initial_capital: b.initial_capital,
            position_sizing: b.position_sizing.clone(),
            slippage: b.slippage.clone(),
            commission: CommissionModel {
                fixed: b.commission_fixed,
                percent: b.commission_pct,
            },
            min_quantity: b.min_quantity,
            risk: self.risk.clone(),
            close_on_finish: b.close_on_finish,
            risk_free_rate: b.risk_free_rate,
            max_gap: b.max_gap,
        }
    }
}

/// General app settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub environment: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "trading-backtester".to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
    /// Also write logs to this file
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> TradingResult<()> {
        match self.format.as_str() {
            "pretty" | "json" => Ok(()),
            other => Err(TradingError::Config(format!(
                "logging.format must be 'pretty' or 'json', got '{}'",
                other
            ))),
        }
    }
}

/// Market data settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// Data source name. Only `csv` is built in.
    pub source: String,
    /// CSV file, or directory of `{symbol}.csv` files
    pub path: PathBuf,
    pub timeframe: Timeframe,
    pub cache_enabled: bool,
    pub cache_dir: PathBuf,
    pub cache_expiration_days: u32,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            source: "csv".to_string(),
            path: PathBuf::from("data"),
            timeframe: Timeframe::Daily,
            cache_enabled: true,
            cache_dir: PathBuf::from("cache"),
            cache_expiration_days: 7,
        }
    }
}

impl DataSettings {
    fn validate(&self) -> TradingResult<()> {
        if self.source != "csv" {
            return Err(TradingError::Config(format!(
                "Unknown data source '{}'",
                self.source
            )));
        }
        Ok(())
    }
}

/// Backtest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSettings {
    pub initial_capital: Decimal,
    pub position_sizing: PositionSizingMethod,
    /// Fixed fee per fill
    pub commission_fixed: Decimal,
    /// Percent of notional per fill
    pub commission_pct: Decimal,
    pub slippage: SlippageModel,
    pub min_quantity: Decimal,
    pub close_on_finish: bool,
    /// Annual, as a fraction
    pub risk_free_rate: f64,
    /// Fail a run when bars are further apart than this many bar durations
    pub max_gap: Option<f64>,
    /// Worker threads for batch runs; 0 uses every core
    pub threads: usize,
}

impl Default for BacktestSettings {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            position_sizing: PositionSizingMethod::AllCash,
            commission_fixed: Decimal::ZERO,
            commission_pct: Decimal::ZERO,
            slippage: SlippageModel::None,
            min_quantity: Decimal::ONE,
            close_on_finish: true,
            risk_free_rate: 0.0,
            max_gap: None,
            threads: 0,
        }
    }
}

/// How results are printed to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// File formats written to the save directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

/// Output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub format: OutputFormat,
    /// Write result files here when set
    pub save_dir: Option<PathBuf>,
    pub export: Vec<ExportFormat>,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            save_dir: None,
            export: vec![ExportFormat::Csv, ExportFormat::Json],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trading_risk::StopLossMethod;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.to_backtest_config(), BacktestConfig::default());
    }

    #[test]
    fn test_conversion_carries_costs_and_risk() {
        let mut config = AppConfig::default();
        config.backtest.commission_fixed = dec!(1);
        config.backtest.commission_pct = dec!(0.1);
        config.risk.stop_loss = StopLossMethod::FixedPercent { percent: dec!(2) };
        config.risk.max_drawdown_pct = Some(dec!(20));

        let bt = config.to_backtest_config();
        assert_eq!(bt.commission.fixed, dec!(1));
        assert_eq!(bt.commission.percent, dec!(0.1));
        assert_eq!(bt.risk.max_drawdown_pct, Some(dec!(20)));
        assert_eq!(bt.risk.stop_loss, config.risk.stop_loss);
    }

    #[test]
    fn test_validation_fails_fast() {
        let mut config = AppConfig::default();
        config.logging.format = "xml".into();
        assert!(matches!(config.validate(), Err(TradingError::Config(_))));

        let mut config = AppConfig::default();
        config.data.source = "yahoo".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.risk.max_drawdown_pct = Some(dec!(10));
        config.risk.drawdown_resume_pct = Some(dec!(15));
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.backtest.initial_capital = Decimal::ZERO;
        assert!(config.validate().is_err());
    }
}
