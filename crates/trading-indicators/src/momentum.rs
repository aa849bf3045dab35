//! Momentum indicators.

use serde::{Deserialize, Serialize};
use trading_core::traits::{Indicator, MultiOutputIndicator};

use crate::moving_average::{align, ema_dense, wilder_dense};
use crate::simd::gains_losses_simd;

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes
/// to evaluate overbought or oversold conditions. Gains and losses use
/// Wilder's smoothing; the first value is at index `period`.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        if data.len() <= self.period {
            return vec![None; data.len()];
        }

        let (gains, losses) = gains_losses_simd(data);
        let avg_gains = wilder_dense(&gains, self.period);
        let avg_losses = wilder_dense(&losses, self.period);

        let rsi = avg_gains
            .iter()
            .zip(avg_losses.iter())
            .map(|(&gain, &loss)| {
                if loss == 0.0 {
                    100.0
                } else {
                    100.0 - (100.0 / (1.0 + gain / loss))
                }
            })
            .collect();

        align(rsi, self.period)
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RSI"
    }
}

/// MACD (Moving Average Convergence Divergence) output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdOutput {
    /// MACD line (fast EMA - slow EMA)
    pub macd: f64,
    /// Signal line (EMA of MACD)
    pub signal: f64,
    /// Histogram (MACD - Signal)
    pub histogram: f64,
}

/// MACD indicator.
///
/// Uses two EMAs to identify trend direction and momentum. The MACD line
/// starts at `slow - 1`, the signal line at `slow + signal - 2`.
#[derive(Debug, Clone)]
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
}

impl Macd {
    /// Create a new MACD with default parameters (12, 26, 9).
    pub fn new() -> Self {
        Self::with_periods(12, 26, 9)
    }

    /// Create a MACD with custom periods.
    pub fn with_periods(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast > 0 && slow > 0 && signal > 0);
        assert!(fast < slow, "Fast period must be less than slow period");
        Self {
            fast_period: fast,
            slow_period: slow,
            signal_period: signal,
        }
    }

    /// MACD line alone, defined from `slow - 1`.
    pub fn line(&self, data: &[f64]) -> Vec<Option<f64>> {
        if data.len() < self.slow_period {
            return vec![None; data.len()];
        }
        align(self.dense_line(data), self.slow_period - 1)
    }

    fn dense_line(&self, data: &[f64]) -> Vec<f64> {
        let fast_ema = ema_dense(data, self.fast_period);
        let slow_ema = ema_dense(data, self.slow_period);

        // Fast EMA starts earlier; drop its head so both line up
        let offset = self.slow_period - self.fast_period;
        fast_ema[offset..]
            .iter()
            .zip(slow_ema.iter())
            .map(|(f, s)| f - s)
            .collect()
    }
}

impl Default for Macd {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for Macd {
    type Outputs = MacdOutput;

    fn calculate(&self, data: &[f64]) -> Vec<Option<MacdOutput>> {
        let lead = self.warmup();
        if data.len() <= lead {
            return vec![None; data.len()];
        }

        let macd_line = self.dense_line(data);
        let signal_line = ema_dense(&macd_line, self.signal_period);

        let mut out = vec![None; lead];
        out.extend(
            macd_line[self.signal_period - 1..]
                .iter()
                .zip(signal_line.iter())
                .map(|(&macd, &signal)| {
                    Some(MacdOutput {
                        macd,
                        signal,
                        histogram: macd - signal,
                    })
                }),
        );
        out
    }

    fn warmup(&self) -> usize {
        self.slow_period + self.signal_period - 2
    }

    fn name(&self) -> &str {
        "MACD"
    }
}

/// Rate of Change: `close[t] / close[t - period] - 1`.
#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Roc {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        (0..data.len())
            .map(|i| {
                if i < self.period {
                    return None;
                }
                let base = data[i - self.period];
                (base != 0.0).then(|| data[i] / base - 1.0)
            })
            .collect()
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "ROC"
    }
}
