//! CLI definitions.

pub mod commands;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use std::path::PathBuf;
use trading_core::types::Timeframe;

/// Used when `--config` is not given and the file exists.
pub const DEFAULT_CONFIG: &str = "config/default.toml";

#[derive(Parser)]
#[command(name = "trading")]
#[command(author, version, about = "Deterministic bar-by-bar strategy backtester")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "TRADING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configuration file)
    #[arg(short, long)]
    pub log_level: Option<LogLevel>,

    /// Enable JSON log format
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more backtests
    Backtest(BacktestArgs),
    /// List available strategies
    Strategies,
    /// Validate configuration
    ValidateConfig,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    Text,
    Json,
}

#[derive(clap::Args, Default)]
pub struct BacktestArgs {
    /// Strategies to backtest (comma-separated or repeated)
    #[arg(short, long, value_delimiter = ',')]
    pub strategy: Vec<String>,

    /// Strategy parameters as JSON, applied to every `--strategy`
    #[arg(long)]
    pub params: Option<String>,

    /// TOML file with `[[strategy]]` tables
    #[arg(long)]
    pub strategies_file: Option<PathBuf>,

    /// Symbols to test (comma-separated)
    #[arg(short = 'S', long, value_delimiter = ',', required = true)]
    pub symbols: Vec<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Bar timeframe (1m, 5m, 15m, 30m, 1h, 1d, 1w, 1mo)
    #[arg(short, long)]
    pub timeframe: Option<Timeframe>,

    /// CSV file, or directory of `{symbol}.csv` files
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// Bypass the data cache
    #[arg(long)]
    pub no_cache: bool,

    /// Initial capital
    #[arg(long)]
    pub capital: Option<Decimal>,

    /// Fixed stop-loss, percent below (above for shorts) the entry price
    #[arg(long, conflicts_with = "trailing_stop_pct")]
    pub stop_loss_pct: Option<Decimal>,

    /// Trailing stop, percent from the best close since entry
    #[arg(long)]
    pub trailing_stop_pct: Option<Decimal>,

    /// Halt trading at this drawdown percentage
    #[arg(long)]
    pub max_drawdown_pct: Option<Decimal>,

    /// Commission as a percent of notional
    #[arg(long)]
    pub commission_pct: Option<Decimal>,

    /// Slippage in basis points
    #[arg(long)]
    pub slippage_bps: Option<Decimal>,

    /// Fail runs whose bars are further apart than this many bar durations
    #[arg(long)]
    pub max_gap: Option<f64>,

    /// Output format
    #[arg(long)]
    pub output: Option<OutputArg>,

    /// Write trades, equity curve and report here
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Worker threads (0 = one per core)
    #[arg(long)]
    pub threads: Option<usize>,
}
