//! Backtesting engine.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};
use trading_core::error::{DataError, TradingError, TradingResult};
use trading_core::traits::Strategy;
use trading_core::types::{to_decimal, Bar, BarSeries, EquityPoint, ExitReason, Fill, PositionSide, Signal, Timeframe, Trade};
use trading_risk::{Action, PositionSizer, PositionSizingMethod, RiskConfig, RiskController};

use crate::execution::{CommissionModel, ExecutionSimulator, SlippageModel};
use crate::ledger::Ledger;
use crate::statistics::{PerformanceAnalyzer, PerformanceReport};

/// Backtest configuration. Read once when a run starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Initial capital
    pub initial_capital: Decimal,
    /// How entries are sized
    pub position_sizing: PositionSizingMethod,
    pub slippage: SlippageModel,
    pub commission: CommissionModel,
    /// Smallest entry quantity that will be filled
    pub min_quantity: Decimal,
    /// Stop-loss and drawdown limits
    pub risk: RiskConfig,
    /// Liquidate an open position at the last bar's close
    pub close_on_finish: bool,
    /// Annual risk-free rate for Sharpe/Sortino, as a fraction
    pub risk_free_rate: f64,
    /// Largest allowed spacing between consecutive bars, in bar durations.
    /// Wider spacing fails the run. `None` disables the check.
    pub max_gap: Option<f64>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: dec!(10000),
            position_sizing: PositionSizingMethod::AllCash,
            slippage: SlippageModel::None,
            commission: CommissionModel::default(),
            min_quantity: Decimal::ONE,
            risk: RiskConfig::default(),
            close_on_finish: true,
            risk_free_rate: 0.0,
            max_gap: None,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> TradingResult<()> {
        if self.initial_capital <= Decimal::ZERO {
            return Err(TradingError::Config(format!(
                "initial_capital must be positive, got {}",
                self.initial_capital
            )));
        }
        if self.min_quantity <= Decimal::ZERO {
            return Err(TradingError::Config(format!(
                "min_quantity must be positive, got {}",
                self.min_quantity
            )));
        }
        if !self.risk_free_rate.is_finite() {
            return Err(TradingError::Config("risk_free_rate must be finite".into()));
        }
        if let Some(gap) = self.max_gap {
            if !gap.is_finite() || gap < 1.0 {
                return Err(TradingError::Config(format!(
                    "max_gap must be at least one bar, got {}",
                    gap
                )));
            }
        }
        self.position_sizing.validate().map_err(TradingError::Config)?;
        self.slippage.validate().map_err(TradingError::Config)?;
        self.commission.validate().map_err(TradingError::Config)?;
        self.risk.validate()
    }
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EngineState {
    #[default]
    Idle,
    Running,
    Completed,
    Failed,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::Completed | EngineState::Failed)
    }
}

/// Everything a completed run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub strategy: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    /// One signal per bar, as emitted by the strategy
    pub signals: Vec<Signal>,
    /// Every fill, in execution order
    pub fills: Vec<Fill>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    /// Bars whose action could not be executed
    pub skipped_bars: Vec<usize>,
    pub report: PerformanceReport,
}

/// Backtesting engine.
///
/// Replays bars strictly in order. An action decided on bar `t` fills at the
/// open of bar `t + 1`.
pub struct BacktestEngine {
    config: BacktestConfig,
    state: EngineState,
}

impl BacktestEngine {
    /// Create a new backtest engine.
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            state: EngineState::Idle,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Run a backtest.
    pub fn run(&mut self, strategy: &dyn Strategy, series: &BarSeries) -> TradingResult<BacktestResult> {
        self.run_with_cancel(strategy, series, None)
    }

    /// Run a backtest, checking `cancel` before every bar.
    pub fn run_with_cancel(
        &mut self,
        strategy: &dyn Strategy,
        series: &BarSeries,
        cancel: Option<&AtomicBool>,
    ) -> TradingResult<BacktestResult> {
        if self.state.is_terminal() {
            return Err(TradingError::Internal(format!(
                "engine already finished with state {:?}",
                self.state
            )));
        }
        self.config.validate()?;

        self.state = EngineState::Running;
        info!(
            strategy = strategy.name(),
            symbol = %series.symbol,
            bars = series.len(),
            "Backtest started"
        );

        match self.replay(strategy, series, cancel) {
            Ok(result) => {
                self.state = EngineState::Completed;
                info!(
                    strategy = strategy.name(),
                    symbol = %series.symbol,
                    trades = result.trades.len(),
                    final_equity = %result.report.final_equity,
                    skipped = result.skipped_bars.len(),
                    "Backtest completed"
                );
                Ok(result)
            }
            Err(e) => {
                self.state = EngineState::Failed;
                error!(
                    strategy = strategy.name(),
                    symbol = %series.symbol,
                    bar_index = ?e.bar_index(),
                    error = %e,
                    "Backtest failed"
                );
                Err(e)
            }
        }
    }

    fn replay(
        &self,
        strategy: &dyn Strategy,
        series: &BarSeries,
        cancel: Option<&AtomicBool>,
    ) -> TradingResult<BacktestResult> {
        let bars = series.bars();
        if bars.is_empty() {
            return Err(DataError::EmptySeries.into());
        }

        let frame = strategy.compute_indicators(bars)?;
        let mut run = RunState::new(&self.config, bars);
        let last = bars.len() - 1;
        let mut signals = Vec::with_capacity(bars.len());
        let mut pending: Option<(Action, usize)> = None;
        let mut previous_timestamp: Option<i64> = None;
        let gap_limit = self
            .config
            .max_gap
            .map(|gap| (gap * series.timeframe.duration_ms() as f64).round() as i64);

        for (index, bar) in bars.iter().enumerate() {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                return Err(TradingError::Cancelled { bar_index: index });
            }

            bar.check(index)?;
            if let Some(previous) = previous_timestamp {
                if bar.timestamp <= previous {
                    return Err(DataError::NonMonotonicTimestamp {
                        index,
                        previous,
                        current: bar.timestamp,
                    }
                    .into());
                }
                if let Some(limit_ms) = gap_limit {
                    if bar.timestamp - previous > limit_ms {
                        return Err(DataError::Gap {
                            index,
                            previous,
                            current: bar.timestamp,
                            limit_ms,
                        }
                        .into());
                    }
                }
            }
            previous_timestamp = Some(bar.timestamp);

            let open = price(bar.open, index)?;
            let close = price(bar.close, index)?;

            if let Some((mut action, signal_index)) = pending.take() {
                if index == last && self.config.close_on_finish {
                    action = exit_only(action);
                }
                run.execute(action, index, bar.timestamp, open, signal_index);
            }

            let side = run.ledger.position_side();
            run.risk.update(run.ledger.mark_to_market(close));

            let signal = strategy.generate_signal(bars, &frame, index, side);
            signals.push(signal);
            let atr = run.atr_at(index);
            run.risk.observe_atr(atr);
            let action = run.risk.evaluate(bar, side, signal);
            run.risk.trail_stop(close, side);

            if index == last {
                if !action.is_hold() {
                    debug!(bar = index, ?action, "Action on the final bar dropped");
                }
                if self.config.close_on_finish {
                    run.close(ExitReason::EndOfData, index, bar.timestamp, close);
                }
            } else if !action.is_hold() {
                pending = Some((action, index));
            }

            run.ledger.record_equity(bar.timestamp, close);
        }

        let analyzer = PerformanceAnalyzer::for_timeframe(series.timeframe, self.config.risk_free_rate);
        let initial = run.ledger.initial_cash();
        let RunState {
            ledger,
            fills,
            skipped_bars,
            ..
        } = run;
        let (equity_curve, trades) = ledger.into_parts();
        let report = analyzer.analyze(initial, &equity_curve, &trades);

        Ok(BacktestResult {
            strategy: strategy.name().to_string(),
            symbol: series.symbol.clone(),
            timeframe: series.timeframe,
            signals,
            fills,
            trades,
            equity_curve,
            skipped_bars,
            report,
        })
    }
}

/// Entries filled on the final bar would be liquidated at the same bar's
/// close, so only the closing half of an action is kept.
fn exit_only(action: Action) -> Action {
    match action {
        Action::Open(_) => Action::Hold,
        Action::Reverse(_) => Action::Close(ExitReason::Signal),
        other => other,
    }
}

fn price(value: f64, index: usize) -> TradingResult<Decimal> {
    to_decimal(value).map_err(|e| {
        TradingError::from(DataError::InvalidBar {
            index,
            reason: e.to_string(),
        })
    })
}

/// Mutable state of one run.
struct RunState {
    ledger: Ledger,
    risk: RiskController,
    executor: ExecutionSimulator,
    sizer: PositionSizer,
    atr: Vec<Option<f64>>,
    fills: Vec<Fill>,
    skipped_bars: Vec<usize>,
}

impl RunState {
    fn new(config: &BacktestConfig, bars: &[Bar]) -> Self {
        let risk = RiskController::new(config.risk.clone(), config.initial_capital);
        let atr = risk.atr_series(bars);
        Self {
            ledger: Ledger::with_capacity(config.initial_capital, bars.len()),
            risk,
            executor: ExecutionSimulator::new(config.slippage.clone(), config.commission.clone())
                .with_min_quantity(config.min_quantity),
            sizer: PositionSizer::new(config.position_sizing.clone()),
            atr,
            fills: Vec::new(),
            skipped_bars: Vec::new(),
        }
    }

    /// ATR stop input on bar `index`, if defined.
    fn atr_at(&self, index: usize) -> Option<Decimal> {
        self.atr
            .get(index)
            .copied()
            .flatten()
            .and_then(|v| to_decimal(v).ok())
    }

    fn execute(&mut self, action: Action, index: usize, timestamp: i64, price: Decimal, signal_index: usize) {
        match action {
            Action::Hold => {}
            Action::Open(side) => self.open(side, index, timestamp, price, signal_index),
            Action::Close(reason) => self.close(reason, index, timestamp, price),
            Action::Reverse(side) => {
                self.close(ExitReason::Signal, index, timestamp, price);
                if self.ledger.position().is_none() {
                    self.open(side, index, timestamp, price, signal_index);
                }
            }
        }
    }

    fn open(&mut self, side: PositionSide, index: usize, timestamp: i64, price: Decimal, signal_index: usize) {
        if self.ledger.position().is_some() {
            return;
        }
        let cash = self.ledger.cash();
        let quantity = self
            .sizer
            .calculate(cash, self.ledger.mark_to_market(price), price);

        match self
            .executor
            .entry_fill(index, timestamp, side, price, quantity, cash)
        {
            Ok(fill) => {
                debug!(
                    bar = index,
                    side = %side,
                    quantity = %fill.quantity,
                    price = %fill.price,
                    commission = %fill.commission,
                    "Entry filled"
                );
                self.ledger.apply_fill(&fill);
                let atr = self.atr_at(signal_index);
                self.risk.on_position_opened(fill.price, side, atr);
                self.fills.push(fill);
            }
            Err(e) => {
                warn!(bar = index, side = %side, error = %e, "Entry skipped");
                self.skipped_bars.push(index);
            }
        }
    }

    fn close(&mut self, reason: ExitReason, index: usize, timestamp: i64, price: Decimal) {
        let Some(position) = self.ledger.position() else {
            return;
        };

        match self
            .executor
            .exit_fill(index, timestamp, position, price, reason)
        {
            Ok(fill) => {
                debug!(
                    bar = index,
                    reason = %reason,
                    quantity = %fill.quantity,
                    price = %fill.price,
                    "Exit filled"
                );
                if let Some(trade) = self.ledger.apply_fill(&fill) {
                    debug!(trade = trade.id, net_pnl = %trade.net_pnl, "Trade closed");
                }
                self.risk.on_position_closed();
                self.fills.push(fill);
            }
            Err(e) => {
                warn!(bar = index, reason = %reason, error = %e, "Exit skipped");
                self.skipped_bars.push(index);
            }
        }
    }
}
