//! Moving average indicators.

use trading_core::traits::Indicator;

use crate::simd::sum_simd;

/// Place `dense` values after `lead` undefined entries.
pub(crate) fn align(dense: Vec<f64>, lead: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(lead + dense.len());
    out.resize(lead, None);
    out.extend(dense.into_iter().map(Some));
    out
}

/// Dense SMA: one value per full window.
pub(crate) fn sma_dense(data: &[f64], period: usize) -> Vec<f64> {
    if data.len() < period || period == 0 {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    let period_f64 = period as f64;

    // Initial sum
    let mut sum = sum_simd(&data[..period]);
    result.push(sum / period_f64);

    // Sliding window
    for i in period..data.len() {
        sum = sum - data[i - period] + data[i];
        result.push(sum / period_f64);
    }

    result
}

/// Dense EMA seeded with the SMA of the first `period` values.
pub(crate) fn ema_dense(data: &[f64], period: usize) -> Vec<f64> {
    if data.len() < period || period == 0 {
        return vec![];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let one_minus_mult = 1.0 - multiplier;
    let mut result = Vec::with_capacity(data.len() - period + 1);

    let mut ema = sum_simd(&data[..period]) / period as f64;
    result.push(ema);

    for &price in &data[period..] {
        ema = price * multiplier + ema * one_minus_mult;
        result.push(ema);
    }

    result
}

/// Wilder's smoothing: `avg = (prev_avg * (period - 1) + value) / period`,
/// seeded with the plain average of the first `period` values.
pub(crate) fn wilder_dense(values: &[f64], period: usize) -> Vec<f64> {
    if values.len() < period || period == 0 {
        return vec![];
    }

    let period_f64 = period as f64;
    let mut result = Vec::with_capacity(values.len() - period + 1);

    let mut avg = sum_simd(&values[..period]) / period_f64;
    result.push(avg);

    for &value in &values[period..] {
        avg = (avg * (period_f64 - 1.0) + value) / period_f64;
        result.push(avg);
    }

    result
}

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values. Defined from index
/// `period - 1`.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        if data.len() < self.period {
            return vec![None; data.len()];
        }
        align(sma_dense(data, self.period), self.period - 1)
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponential Moving Average (EMA).
///
/// Smoothing factor `2 / (period + 1)`, seeded with the SMA of the first
/// `period` values. Defined from index `period - 1`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        if data.len() < self.period {
            return vec![None; data.len()];
        }
        align(ema_dense(data, self.period), self.period - 1)
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "EMA"
    }
}
