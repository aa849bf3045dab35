//! Backtest command implementation.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use trading_backtest::{
    all_succeeded, write_all, BacktestConfig, BatchJob, BatchRunner, CsvReportWriter,
    JsonReportWriter, ReportWriter, RunOutcome, SlippageModel,
};
use trading_config::{AppConfig, ExportFormat, OutputFormat};
use trading_core::traits::DataSource;
use trading_core::types::Timeframe;
use trading_data::{load_series, CachedDataSource, CsvDataSource, DataCache};
use trading_risk::StopLossMethod;
use trading_strategies::{StrategyRegistry, StrategySpec};

use crate::cli::{BacktestArgs, OutputArg};

pub async fn run(args: BacktestArgs, mut config: AppConfig) -> Result<()> {
    apply_overrides(&args, &mut config);
    config.validate().context("Invalid backtest settings")?;

    let specs = resolve_strategies(&args)?;
    let (start, end) = date_range(args.start, args.end)?;
    let timeframe = config.data.timeframe;

    let source = data_source(&config)?;
    let backtest_config = config.to_backtest_config();

    let (jobs, load_failures) = prepare_jobs(
        source.as_ref(),
        &args.symbols,
        &specs,
        timeframe,
        (start, end),
        &backtest_config,
    )
    .await;
    info!(jobs = jobs.len(), strategies = specs.len(), symbols = args.symbols.len(), "Starting backtests");

    let runner = BatchRunner::new(config.backtest.threads)?;
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling remaining runs");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }
    let outcomes = {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || runner.run(jobs, Some(cancel.as_ref()))).await?
    };
    let outcomes: Vec<RunOutcome> = load_failures.into_iter().chain(outcomes).collect();

    print_outcomes(&outcomes, config.output.format)?;
    if let Some(dir) = &config.output.save_dir {
        save_outcomes(&outcomes, dir, &config.output.export);
    }

    if !all_succeeded(&outcomes) {
        let unsuccessful = outcomes.iter().filter(|o| !o.is_completed()).count();
        bail!("{} of {} runs did not complete", unsuccessful, outcomes.len());
    }
    Ok(())
}

/// One job per (strategy, symbol). A symbol whose data cannot be loaded
/// fails each of its runs up front; the other symbols still run.
async fn prepare_jobs(
    source: &dyn DataSource,
    symbols: &[String],
    specs: &[StrategySpec],
    timeframe: Timeframe,
    (start, end): (DateTime<Utc>, DateTime<Utc>),
    config: &BacktestConfig,
) -> (Vec<BatchJob>, Vec<RunOutcome>) {
    let mut jobs = Vec::new();
    let mut failures = Vec::new();
    for symbol in symbols {
        let labels = specs
            .iter()
            .enumerate()
            .map(|(i, spec)| format!("{:02}-{}-{}", i + 1, spec.name(), symbol));

        match load_series(source, symbol, timeframe, start, end).await {
            Ok(series) => {
                let series = Arc::new(series);
                for (label, spec) in labels.zip(specs) {
                    jobs.push(BatchJob::new(label, spec.clone(), series.clone(), config.clone()));
                }
            }
            Err(e) => {
                error!(symbol = %symbol, error = %e, "Failed to load data");
                let reason = format!("Failed to load data for {}: {}", symbol, e);
                failures.extend(labels.map(|label| RunOutcome::Failed {
                    label,
                    reason: reason.clone(),
                    bar_index: None,
                }));
            }
        }
    }
    (jobs, failures)
}

/// Fold command-line overrides into the loaded configuration.
fn apply_overrides(args: &BacktestArgs, config: &mut AppConfig) {
    if let Some(timeframe) = args.timeframe {
        config.data.timeframe = timeframe;
    }
    if let Some(path) = &args.data {
        config.data.path = path.clone();
    }
    if args.no_cache {
        config.data.cache_enabled = false;
    }
    if let Some(capital) = args.capital {
        config.backtest.initial_capital = capital;
    }
    if let Some(percent) = args.stop_loss_pct {
        config.risk.stop_loss = StopLossMethod::FixedPercent { percent };
    }
    if let Some(percent) = args.trailing_stop_pct {
        config.risk.stop_loss = StopLossMethod::TrailingPercent { percent };
    }
    if let Some(max) = args.max_drawdown_pct {
        config.risk.max_drawdown_pct = Some(max);
        config.risk.drawdown_resume_pct = None;
    }
    if let Some(percent) = args.commission_pct {
        config.backtest.commission_pct = percent;
    }
    if let Some(bps) = args.slippage_bps {
        config.backtest.slippage = SlippageModel::BasisPoints { bps };
    }
    if let Some(gap) = args.max_gap {
        config.backtest.max_gap = Some(gap);
    }
    if let Some(threads) = args.threads {
        config.backtest.threads = threads;
    }
    if let Some(output) = args.output {
        config.output.format = match output {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
        };
    }
    if let Some(dir) = &args.save_dir {
        config.output.save_dir = Some(dir.clone());
    }
}

fn resolve_strategies(args: &BacktestArgs) -> Result<Vec<StrategySpec>> {
    let mut specs = match &args.strategies_file {
        Some(path) => trading_config::load_strategies(path)
            .with_context(|| format!("Failed to read strategies from {}", path.display()))?,
        None => Vec::new(),
    };

    let params = match &args.params {
        Some(json) => serde_json::from_str(json).context("--params is not valid JSON")?,
        None => serde_json::Value::Null,
    };
    let registry = StrategyRegistry::new();
    for name in &args.strategy {
        let spec = registry
            .spec(name, params.clone())
            .with_context(|| format!("Failed to configure strategy '{}'", name))?;
        specs.push(spec);
    }

    if specs.is_empty() {
        bail!("No strategies given; use --strategy or --strategies-file (see `trading strategies`)");
    }
    Ok(specs)
}

fn date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = start.unwrap_or(NaiveDate::MIN);
    let end = end.unwrap_or(NaiveDate::MAX);
    if end < start {
        bail!("End date {} is before start date {}", end, start);
    }
    // The end date is inclusive
    let end_time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    Ok((
        start.and_time(NaiveTime::MIN).and_utc(),
        end.and_time(end_time).and_utc(),
    ))
}

fn data_source(config: &AppConfig) -> Result<Box<dyn DataSource>> {
    let data = &config.data;
    let csv = CsvDataSource::new(&data.path).with_context(|| {
        format!(
            "Data path '{}' does not exist. Provide a CSV file or a directory of CSV files with --data",
            data.path.display()
        )
    })?;

    let source = if data.cache_enabled {
        CachedDataSource::new(csv, DataCache::new(&data.cache_dir, data.cache_expiration_days))
    } else {
        CachedDataSource::disabled(csv)
    };
    Ok(Box::new(source))
}

fn print_outcomes(outcomes: &[RunOutcome], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let values = outcomes
                .iter()
                .map(outcome_json)
                .collect::<Result<Vec<_>, _>>()?;
            println!("{}", serde_json::to_string_pretty(&values)?);
        }
        OutputFormat::Text => {
            for outcome in outcomes {
                match outcome {
                    RunOutcome::Completed { label, result } => {
                        println!("[{}]", label);
                        println!("{}", result.summary());
                    }
                    RunOutcome::Failed {
                        label,
                        reason,
                        bar_index,
                    } => match bar_index {
                        Some(index) => println!("[{}] FAILED at bar {}: {}", label, index, reason),
                        None => println!("[{}] FAILED: {}", label, reason),
                    },
                    RunOutcome::Cancelled { label } => println!("[{}] CANCELLED", label),
                }
            }
        }
    }
    Ok(())
}

fn outcome_json(outcome: &RunOutcome) -> Result<serde_json::Value, serde_json::Error> {
    Ok(match outcome {
        RunOutcome::Completed { label, result } => serde_json::json!({
            "label": label,
            "status": "completed",
            "result": serde_json::to_value(result)?,
        }),
        RunOutcome::Failed {
            label,
            reason,
            bar_index,
        } => serde_json::json!({
            "label": label,
            "status": "failed",
            "reason": reason,
            "bar_index": bar_index,
        }),
        RunOutcome::Cancelled { label } => serde_json::json!({
            "label": label,
            "status": "cancelled",
        }),
    })
}

/// Export completed runs, one subdirectory per job. Failures are logged only.
fn save_outcomes(outcomes: &[RunOutcome], dir: &Path, formats: &[ExportFormat]) {
    for outcome in outcomes {
        let Some(result) = outcome.result() else {
            continue;
        };
        let job_dir = dir.join(outcome.label());
        let writers: Vec<Box<dyn ReportWriter>> = formats
            .iter()
            .map(|format| -> Box<dyn ReportWriter> {
                match format {
                    ExportFormat::Csv => Box::new(CsvReportWriter::new(&job_dir)),
                    ExportFormat::Json => Box::new(JsonReportWriter::new(&job_dir)),
                }
            })
            .collect();

        let failures = write_all(&writers, result);
        if failures == 0 {
            info!(label = outcome.label(), dir = %job_dir.display(), "Results saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_overrides_replace_config_values() {
        let args = BacktestArgs {
            capital: Some(dec!(50000)),
            trailing_stop_pct: Some(dec!(4)),
            max_drawdown_pct: Some(dec!(15)),
            slippage_bps: Some(dec!(2)),
            max_gap: Some(5.0),
            output: Some(OutputArg::Json),
            no_cache: true,
            ..Default::default()
        };
        let mut config = AppConfig::default();
        config.risk.drawdown_resume_pct = Some(dec!(1));
        config.risk.max_drawdown_pct = Some(dec!(5));
        apply_overrides(&args, &mut config);

        assert_eq!(config.backtest.initial_capital, dec!(50000));
        assert_eq!(
            config.risk.stop_loss,
            StopLossMethod::TrailingPercent { percent: dec!(4) }
        );
        assert_eq!(config.risk.max_drawdown_pct, Some(dec!(15)));
        assert_eq!(config.risk.drawdown_resume_pct, None);
        assert_eq!(config.backtest.slippage, SlippageModel::BasisPoints { bps: dec!(2) });
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(!config.data.cache_enabled);
        assert_eq!(config.to_backtest_config().max_gap, Some(5.0));
        config.validate().unwrap();
    }

    #[test]
    fn test_strategies_resolved_from_names() {
        let args = BacktestArgs {
            strategy: vec!["sma_crossover".into(), "rsi".into()],
            ..Default::default()
        };
        let specs = resolve_strategies(&args).unwrap();
        assert_eq!(specs.len(), 2);

        let unknown = BacktestArgs {
            strategy: vec!["astrology".into()],
            ..Default::default()
        };
        assert!(resolve_strategies(&unknown).is_err());
        assert!(resolve_strategies(&BacktestArgs::default()).is_err());
    }

    #[tokio::test]
    async fn test_missing_symbol_fails_only_its_runs() {
        let dir = tempfile::tempdir().unwrap();
        let rows: String = (1..=9)
            .map(|d| format!("2024-01-0{d},100,101,99,100,1000\n"))
            .collect();
        std::fs::write(
            dir.path().join("SPY.csv"),
            format!("date,open,high,low,close,volume\n{rows}"),
        )
        .unwrap();
        let source = CsvDataSource::new(dir.path()).unwrap();

        let specs = resolve_strategies(&BacktestArgs {
            strategy: vec!["sma_crossover".into(), "rsi".into()],
            ..Default::default()
        })
        .unwrap();
        let symbols = vec!["MISSING".to_string(), "SPY".to_string()];
        let range = date_range(None, None).unwrap();

        let (jobs, failures) = prepare_jobs(
            &source,
            &symbols,
            &specs,
            Timeframe::Daily,
            range,
            &BacktestConfig::default(),
        )
        .await;

        assert_eq!(failures.len(), 2);
        for failure in &failures {
            assert!(failure.label().ends_with("-MISSING"));
            assert!(matches!(failure, RunOutcome::Failed { bar_index: None, .. }));
        }

        assert_eq!(jobs.len(), 2);
        assert!(jobs.iter().all(|job| job.label.ends_with("-SPY")));
        let outcomes = BatchRunner::new(1).unwrap().run(jobs, None);
        assert!(outcomes.iter().all(RunOutcome::is_completed));
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1);
        let (start, end) = date_range(day, day).unwrap();
        assert!(end > start);
        assert_eq!(end.date_naive(), start.date_naive());

        let later = NaiveDate::from_ymd_opt(2024, 4, 1);
        assert!(date_range(later, day).is_err());
    }
}
