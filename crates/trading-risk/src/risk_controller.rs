//! Risk controller: turns a strategy signal into an approved action.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trading_core::{
    error::TradingError,
    traits::OhlcvIndicator,
    types::{Bar, ExitReason, PositionSide, Signal},
};
use trading_indicators::Atr;

use crate::{
    drawdown::{DrawdownGuard, DrawdownTransition},
    StopLossManager, StopLossMethod,
};

/// Risk management configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Stop-loss method applied to every new position
    pub stop_loss: StopLossMethod,
    /// Halt trading once drawdown from the peak reaches this percentage
    pub max_drawdown_pct: Option<Decimal>,
    /// Resume once drawdown falls below this percentage (defaults to half the maximum)
    pub drawdown_resume_pct: Option<Decimal>,
    /// ATR lookback for ATR stops
    pub atr_period: usize,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_loss: StopLossMethod::None,
            max_drawdown_pct: None,
            drawdown_resume_pct: None,
            atr_period: 14,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), TradingError> {
        self.stop_loss.validate().map_err(TradingError::Config)?;

        if self.atr_period == 0 {
            return Err(TradingError::Config("atr_period must be positive".into()));
        }

        match (self.max_drawdown_pct, self.drawdown_resume_pct) {
            (None, Some(_)) => Err(TradingError::Config(
                "drawdown_resume_pct requires max_drawdown_pct".into(),
            )),
            (Some(max), resume) => {
                if max <= Decimal::ZERO || max > dec!(100) {
                    return Err(TradingError::Config(format!(
                        "max_drawdown_pct must be in (0, 100], got {}",
                        max
                    )));
                }
                match resume {
                    Some(r) if r <= Decimal::ZERO || r >= max => Err(TradingError::Config(format!(
                        "drawdown_resume_pct must be in (0, {}), got {}",
                        max, r
                    ))),
                    _ => Ok(()),
                }
            }
            (None, None) => Ok(()),
        }
    }
}

/// Snapshot of the controller's running state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskState {
    pub peak_equity: Decimal,
    /// Decline from the peak, in percent
    pub drawdown_pct: Decimal,
    /// Stop level of the open position, if any
    pub stop_price: Option<Decimal>,
    /// ATR on the current bar, when the stop method uses it
    pub atr: Option<Decimal>,
    /// Entries are vetoed while halted
    pub halted: bool,
}

/// Approved action for the next fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Action {
    #[default]
    Hold,
    /// Open a position from flat
    Open(PositionSide),
    /// Close the open position
    Close(ExitReason),
    /// Close the open position and open the opposite one
    Reverse(PositionSide),
}

impl Action {
    pub fn is_hold(&self) -> bool {
        matches!(self, Action::Hold)
    }
}

/// Inputs a rule sees for one bar.
#[derive(Debug, Clone, Copy)]
pub struct RiskContext<'a> {
    pub bar: &'a Bar,
    pub position: PositionSide,
    pub signal: Signal,
    pub state: &'a RiskState,
}

/// One override rule. Rules run in order; the first `Some` wins.
pub trait RiskRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ctx: &RiskContext<'_>) -> Option<Action>;
}

/// Force an exit when the bar's range reaches the stop level.
#[derive(Debug, Clone, Copy, Default)]
pub struct StopLossRule;

impl RiskRule for StopLossRule {
    fn name(&self) -> &'static str {
        "stop_loss"
    }

    fn evaluate(&self, ctx: &RiskContext<'_>) -> Option<Action> {
        if ctx.position == PositionSide::Flat {
            return None;
        }
        let stop = ctx.state.stop_price?;
        StopLossManager::is_triggered_by(stop, ctx.bar, ctx.position)
            .then_some(Action::Close(ExitReason::StopLoss))
    }
}

/// Liquidate and veto entries while the drawdown guard is halted.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawdownRule;

impl RiskRule for DrawdownRule {
    fn name(&self) -> &'static str {
        "drawdown"
    }

    fn evaluate(&self, ctx: &RiskContext<'_>) -> Option<Action> {
        if !ctx.state.halted {
            return None;
        }
        if ctx.position != PositionSide::Flat {
            return Some(Action::Close(ExitReason::Drawdown));
        }
        if ctx.signal.is_entry() {
            warn!(
                timestamp = ctx.bar.timestamp,
                signal = %ctx.signal,
                drawdown_pct = %ctx.state.drawdown_pct,
                "Entry vetoed by drawdown halt"
            );
        }
        Some(Action::Hold)
    }
}

/// Hold entries back while the ATR a new stop would be set from is undefined.
///
/// Only installed for ATR stops. A reversal is reduced to a plain exit.
#[derive(Debug, Clone, Copy, Default)]
pub struct AtrWarmupRule;

impl RiskRule for AtrWarmupRule {
    fn name(&self) -> &'static str {
        "atr_warmup"
    }

    fn evaluate(&self, ctx: &RiskContext<'_>) -> Option<Action> {
        if ctx.state.atr.is_some() {
            return None;
        }
        let held = match RiskController::signal_to_action(ctx.signal, ctx.position) {
            Action::Open(_) => Action::Hold,
            Action::Reverse(_) => Action::Close(ExitReason::Signal),
            _ => return None,
        };
        warn!(
            timestamp = ctx.bar.timestamp,
            signal = %ctx.signal,
            "Entry held until ATR is available for the stop"
        );
        Some(held)
    }
}

/// Applies stop-loss and drawdown overrides to strategy signals.
///
/// Owns the running [`RiskState`]; the engine feeds it equity once per bar
/// and tells it when positions open and close.
pub struct RiskController {
    config: RiskConfig,
    stop_loss: StopLossManager,
    drawdown: DrawdownGuard,
    stop_price: Option<Decimal>,
    atr: Option<Decimal>,
    rules: Vec<Box<dyn RiskRule>>,
}

impl RiskController {
    pub fn new(config: RiskConfig, initial_equity: Decimal) -> Self {
        let drawdown = DrawdownGuard::new(
            initial_equity,
            config.max_drawdown_pct,
            config.drawdown_resume_pct,
        );
        let mut rules: Vec<Box<dyn RiskRule>> = vec![Box::new(StopLossRule), Box::new(DrawdownRule)];
        if config.stop_loss.needs_atr() {
            rules.push(Box::new(AtrWarmupRule));
        }
        Self {
            stop_loss: StopLossManager::new(config.stop_loss.clone()),
            drawdown,
            stop_price: None,
            atr: None,
            rules,
            config,
        }
    }

    /// Append a rule after the built-in ones.
    pub fn with_rule(mut self, rule: Box<dyn RiskRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// ATR series for ATR stops; all `None` when the stop method does not use it.
    pub fn atr_series(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        if !self.config.stop_loss.needs_atr() {
            return vec![None; bars.len()];
        }
        let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
        let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
        let close: Vec<f64> = bars.iter().map(|b| b.close).collect();
        Atr::new(self.config.atr_period).calculate(&high, &low, &close)
    }

    /// ATR of the bar about to be evaluated. Ignored unless the stop uses ATR.
    pub fn observe_atr(&mut self, atr: Option<Decimal>) {
        self.atr = atr;
    }

    /// Per-bar drawdown update from the bar's mark-to-market equity.
    pub fn update(&mut self, equity: Decimal) {
        match self.drawdown.update(equity) {
            DrawdownTransition::Halted => warn!(
                equity = %equity,
                peak = %self.drawdown.peak_equity(),
                drawdown_pct = %self.drawdown.drawdown_pct(),
                "Maximum drawdown reached, trading halted"
            ),
            DrawdownTransition::Resumed => info!(
                equity = %equity,
                drawdown_pct = %self.drawdown.drawdown_pct(),
                "Drawdown recovered, trading resumed"
            ),
            DrawdownTransition::Unchanged => {}
        }
    }

    /// Ratchet a trailing stop on the bar's close. Takes effect from the next
    /// bar, so a bar is always tested against the stop in force during it.
    pub fn trail_stop(&mut self, close: Decimal, position: PositionSide) {
        if position == PositionSide::Flat || !self.config.stop_loss.is_trailing() {
            return;
        }
        if let Some(stop) = self.stop_price {
            self.stop_price = Some(self.stop_loss.update_trailing_stop(stop, close, position));
        }
    }

    /// Set the stop level for a freshly opened position.
    pub fn on_position_opened(&mut self, entry_price: Decimal, side: PositionSide, atr: Option<Decimal>) {
        self.stop_price = self.stop_loss.calculate_stop_price(entry_price, side, atr);
    }

    pub fn on_position_closed(&mut self) {
        self.stop_price = None;
    }

    pub fn state(&self) -> RiskState {
        RiskState {
            peak_equity: self.drawdown.peak_equity(),
            drawdown_pct: self.drawdown.drawdown_pct(),
            stop_price: self.stop_price,
            atr: self.atr,
            halted: self.drawdown.is_halted(),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.drawdown.is_halted()
    }

    /// Approve, override or veto the strategy's signal for this bar.
    pub fn evaluate(&self, bar: &Bar, position: PositionSide, signal: Signal) -> Action {
        let state = self.state();
        let ctx = RiskContext {
            bar,
            position,
            signal,
            state: &state,
        };

        for rule in &self.rules {
            if let Some(action) = rule.evaluate(&ctx) {
                if let Action::Close(reason) = action {
                    warn!(rule = rule.name(), reason = %reason, timestamp = bar.timestamp, "Forced exit");
                }
                return action;
            }
        }
        Self::signal_to_action(signal, position)
    }

    /// Pass-through translation of a signal given the current position.
    pub fn signal_to_action(signal: Signal, position: PositionSide) -> Action {
        match (signal, position) {
            (Signal::Hold, _) => Action::Hold,
            (Signal::Long, PositionSide::Flat) => Action::Open(PositionSide::Long),
            (Signal::Long, PositionSide::Short) => Action::Reverse(PositionSide::Long),
            (Signal::Short, PositionSide::Flat) => Action::Open(PositionSide::Short),
            (Signal::Short, PositionSide::Long) => Action::Reverse(PositionSide::Short),
            (Signal::Long, PositionSide::Long) | (Signal::Short, PositionSide::Short) => {
                Action::Hold
            }
            (Signal::Exit, PositionSide::Flat) => Action::Hold,
            (Signal::Exit, _) => Action::Close(ExitReason::Signal),
        }
    }
}
