//! Strategy trait definitions.

use crate::error::{IndicatorError, StrategyError};
use crate::types::{Bar, IndicatorFrame, PositionSide, Signal};

/// Configuration trait for strategies.
pub trait StrategyConfig: Send + Sync + Clone + 'static {
    /// Validate the configuration.
    fn validate(&self) -> Result<(), StrategyError>;
}

/// Everything a decision rule may look at for one bar.
///
/// `bars` and `frame` may extend past `index`; rules must only read entries
/// up to and including `index`.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub bars: &'a [Bar],
    pub frame: &'a IndicatorFrame,
    pub index: usize,
    pub position: PositionSide,
}

impl<'a> SignalContext<'a> {
    /// The bar being decided on.
    pub fn bar(&self) -> &'a Bar {
        &self.bars[self.index]
    }

    /// Indicator value at the current bar.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.frame.value(name, self.index)
    }

    /// Indicator value at the previous bar.
    pub fn previous(&self, name: &str) -> Option<f64> {
        self.index
            .checked_sub(1)
            .and_then(|i| self.frame.value(name, i))
    }
}

/// Core strategy trait.
///
/// A strategy is split into an indicator step, run once over the full
/// series, and a decision rule evaluated per bar. Both take `&self`, so a
/// strategy carries no mutable state between bars and replays are
/// deterministic.
pub trait Strategy: Send + Sync {
    /// Get the unique name of this strategy.
    fn name(&self) -> &str;

    /// Get a description of the strategy.
    fn description(&self) -> &str {
        ""
    }

    /// Number of leading bars that must always produce `Hold`.
    fn warmup_period(&self) -> usize;

    /// Compute every indicator the decision rule reads, aligned to `bars`.
    fn compute_indicators(&self, bars: &[Bar]) -> Result<IndicatorFrame, IndicatorError>;

    /// Decision rule for one bar. `None` means an input was undefined.
    fn decide(&self, ctx: &SignalContext<'_>) -> Option<Signal>;

    /// Signal for bar `index`, with warm-up gating applied.
    fn generate_signal(
        &self,
        bars: &[Bar],
        frame: &IndicatorFrame,
        index: usize,
        position: PositionSide,
    ) -> Signal {
        if index >= bars.len() || index < self.warmup_period() {
            return Signal::Hold;
        }
        let ctx = SignalContext {
            bars,
            frame,
            index,
            position,
        };
        self.decide(&ctx).unwrap_or(Signal::Hold)
    }

    /// Check if the strategy can act on bar `index`.
    fn is_warmed_up(&self, index: usize) -> bool {
        index >= self.warmup_period()
    }
}
