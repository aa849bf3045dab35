//! Backtesting engine.
//!
//! Replays a bar series through a strategy, the risk controller, the
//! execution simulator and the ledger, then summarises the run.

mod batch;
mod engine;
mod execution;
mod export;
mod ledger;
mod report;
mod statistics;

pub use batch::{all_succeeded, BatchJob, BatchRunner, RunOutcome};
pub use engine::{BacktestConfig, BacktestEngine, BacktestResult, EngineState};
pub use execution::{CommissionModel, ExecutionSimulator, SlippageModel};
pub use export::{write_all, CsvReportWriter, JsonReportWriter, ReportWriter};
pub use ledger::Ledger;
pub use statistics::{max_drawdown_pct, period_returns, PerformanceAnalyzer, PerformanceReport};
