//! Parallel execution of independent backtests.

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use trading_core::error::{TradingError, TradingResult};
use trading_core::types::BarSeries;
use trading_strategies::StrategySpec;

use crate::engine::{BacktestConfig, BacktestEngine, BacktestResult};

/// One unit of work: a strategy, the bars to run it on, and the settings.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Caller-chosen label, echoed in the outcome
    pub label: String,
    pub strategy: StrategySpec,
    /// Shared read-only between jobs
    pub series: Arc<BarSeries>,
    pub config: BacktestConfig,
}

impl BatchJob {
    pub fn new(
        label: impl Into<String>,
        strategy: StrategySpec,
        series: Arc<BarSeries>,
        config: BacktestConfig,
    ) -> Self {
        Self {
            label: label.into(),
            strategy,
            series,
            config,
        }
    }
}

/// Result of one job.
#[derive(Debug)]
pub enum RunOutcome {
    Completed {
        label: String,
        result: Box<BacktestResult>,
    },
    Failed {
        label: String,
        reason: String,
        /// Offending bar for data errors
        bar_index: Option<usize>,
    },
    Cancelled {
        label: String,
    },
}

impl RunOutcome {
    pub fn label(&self) -> &str {
        match self {
            RunOutcome::Completed { label, .. }
            | RunOutcome::Failed { label, .. }
            | RunOutcome::Cancelled { label } => label,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }

    pub fn result(&self) -> Option<&BacktestResult> {
        match self {
            RunOutcome::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    fn from_run(label: String, run: TradingResult<BacktestResult>) -> Self {
        match run {
            Ok(result) => RunOutcome::Completed {
                label,
                result: Box::new(result),
            },
            Err(TradingError::Cancelled { .. }) => RunOutcome::Cancelled { label },
            Err(e) => RunOutcome::Failed {
                label,
                bar_index: e.bar_index(),
                reason: e.to_string(),
            },
        }
    }
}

/// True when every outcome completed.
pub fn all_succeeded(outcomes: &[RunOutcome]) -> bool {
    outcomes.iter().all(RunOutcome::is_completed)
}

/// Worker pool for batches of backtests.
///
/// Each job gets its own engine, ledger and strategy instance; nothing is
/// shared between workers except the immutable bar series. Failed runs are
/// reported, never retried, and do not stop the rest of the batch.
pub struct BatchRunner {
    pool: rayon::ThreadPool,
}

impl BatchRunner {
    /// `threads == 0` uses one thread per core.
    pub fn new(threads: usize) -> TradingResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("backtest-{}", i))
            .build()
            .map_err(|e| TradingError::Internal(format!("failed to build thread pool: {}", e)))?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Run all jobs; outcomes come back in job order.
    ///
    /// Setting `cancel` lets in-flight runs finish their current bar and
    /// marks every unfinished job as cancelled.
    pub fn run(&self, jobs: Vec<BatchJob>, cancel: Option<&AtomicBool>) -> Vec<RunOutcome> {
        info!(jobs = jobs.len(), threads = self.threads(), "Batch started");

        let outcomes: Vec<RunOutcome> = self.pool.install(|| {
            jobs.into_par_iter()
                .map(|job| Self::run_job(job, cancel))
                .collect()
        });

        let completed = outcomes.iter().filter(|o| o.is_completed()).count();
        info!(
            completed,
            failed = outcomes.len() - completed,
            "Batch finished"
        );
        outcomes
    }

    fn run_job(job: BatchJob, cancel: Option<&AtomicBool>) -> RunOutcome {
        if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return RunOutcome::Cancelled { label: job.label };
        }

        let strategy = match job.strategy.build() {
            Ok(strategy) => strategy,
            Err(e) => {
                error!(label = %job.label, error = %e, "Strategy could not be built");
                return RunOutcome::Failed {
                    label: job.label,
                    reason: TradingError::from(e).to_string(),
                    bar_index: None,
                };
            }
        };

        let mut engine = BacktestEngine::new(job.config);
        let run = engine.run_with_cancel(strategy.as_ref(), &job.series, cancel);
        if let Err(TradingError::Cancelled { bar_index }) = &run {
            warn!(label = %job.label, bar_index, "Run cancelled");
        }
        RunOutcome::from_run(job.label, run)
    }
}
