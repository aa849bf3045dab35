//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use trading_core::error::IndicatorError;
use trading_core::traits::{SignalContext, Strategy};
use trading_core::types::{Bar, BarSeries, IndicatorFrame, Signal, Timeframe};

pub const DAY_MS: i64 = 86_400_000;

/// Bar opening at `open` and closing at `close`, half a point of range each way.
pub fn bar(index: usize, open: f64, close: f64) -> Bar {
    Bar::new(
        index as i64 * DAY_MS,
        open,
        open.max(close) + 0.5,
        open.min(close) - 0.5,
        close,
        10_000.0,
    )
}

/// Gapless daily bars: each bar opens at the previous close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            bar(i, open, close)
        })
        .collect()
}

pub fn series(closes: &[f64]) -> BarSeries {
    BarSeries::from_bars("TEST", Timeframe::Daily, bars_from_closes(closes))
}

/// Wants to be long on every bar.
pub struct AlwaysLong;

impl Strategy for AlwaysLong {
    fn name(&self) -> &str {
        "always_long"
    }

    fn warmup_period(&self) -> usize {
        0
    }

    fn compute_indicators(&self, bars: &[Bar]) -> Result<IndicatorFrame, IndicatorError> {
        Ok(IndicatorFrame::new(bars.len()))
    }

    fn decide(&self, _ctx: &SignalContext<'_>) -> Option<Signal> {
        Some(Signal::Long)
    }
}
