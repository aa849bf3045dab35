//! Volatility indicators.

use serde::{Deserialize, Serialize};
use trading_core::traits::{Indicator, MultiOutputIndicator, OhlcvIndicator};

use crate::moving_average::{align, sma_dense, wilder_dense};
use crate::simd::{std_dev_simd, true_range_simd};

/// Rolling population standard deviation.
#[derive(Debug, Clone)]
pub struct StdDev {
    period: usize,
}

impl StdDev {
    /// Create a new standard deviation indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for StdDev {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<Option<f64>> {
        if data.len() < self.period {
            return vec![None; data.len()];
        }
        align(std_dev_simd(data, self.period), self.period - 1)
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "StdDev"
    }
}

/// Average True Range (ATR) with Wilder's smoothing.
///
/// True ranges are taken from bar 1 onward (each needs a previous close),
/// so the first value is the mean of `period` true ranges at index `period`.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
}

impl Atr {
    /// Create a new ATR indicator.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl OhlcvIndicator for Atr {
    type Output = f64;

    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<Option<f64>> {
        let len = close.len();
        if len <= self.period || high.len() != len || low.len() != len {
            return vec![None; len];
        }

        let tr = true_range_simd(high, low, close);
        align(wilder_dense(&tr[1..], self.period), self.period)
    }

    fn warmup(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "ATR"
    }
}

/// Bollinger Bands output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerOutput {
    /// Upper band
    pub upper: f64,
    /// Middle band (SMA)
    pub middle: f64,
    /// Lower band
    pub lower: f64,
    /// Bandwidth ((upper - lower) / middle)
    pub bandwidth: f64,
    /// %B ((price - lower) / (upper - lower))
    pub percent_b: f64,
}

impl BollingerOutput {
    /// Check if price is above upper band.
    pub fn is_overbought(&self, price: f64) -> bool {
        price > self.upper
    }

    /// Check if price is below lower band.
    pub fn is_oversold(&self, price: f64) -> bool {
        price < self.lower
    }
}

/// Bollinger Bands.
///
/// Consists of a middle band (SMA) with upper and lower bands
/// at a specified number of population standard deviations.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    period: usize,
    std_dev_multiplier: f64,
}

impl BollingerBands {
    /// Create new Bollinger Bands with default parameters (20, 2.0).
    pub fn new() -> Self {
        Self::with_params(20, 2.0)
    }

    /// Create Bollinger Bands with custom parameters.
    pub fn with_params(period: usize, std_dev_multiplier: f64) -> Self {
        assert!(period > 1, "Period must be greater than 1");
        assert!(
            std_dev_multiplier > 0.0,
            "Std dev multiplier must be positive"
        );
        Self {
            period,
            std_dev_multiplier,
        }
    }
}

impl Default for BollingerBands {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiOutputIndicator for BollingerBands {
    type Outputs = BollingerOutput;

    fn calculate(&self, data: &[f64]) -> Vec<Option<BollingerOutput>> {
        if data.len() < self.period {
            return vec![None; data.len()];
        }

        let means = sma_dense(data, self.period);
        let std_devs = std_dev_simd(data, self.period);

        let mut out = vec![None; self.period - 1];
        out.extend(means.iter().zip(std_devs.iter()).enumerate().map(
            |(i, (&mean, &std_dev))| {
                let upper = mean + self.std_dev_multiplier * std_dev;
                let lower = mean - self.std_dev_multiplier * std_dev;

                let bandwidth = if mean != 0.0 {
                    (upper - lower) / mean
                } else {
                    0.0
                };

                let price = data[self.period - 1 + i];
                let percent_b = if upper != lower {
                    (price - lower) / (upper - lower)
                } else {
                    0.5
                };

                Some(BollingerOutput {
                    upper,
                    middle: mean,
                    lower,
                    bandwidth,
                    percent_b,
                })
            },
        ));
        out
    }

    fn warmup(&self) -> usize {
        self.period - 1
    }

    fn name(&self) -> &str {
        "Bollinger Bands"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_dev() {
        let std_dev = StdDev::new(3);
        let data = vec![2.0, 4.0, 6.0, 8.0, 10.0];
        let result = std_dev.calculate(&data);

        assert_eq!(result.len(), 5);
        assert!(result[1].is_none());
        // First window: [2, 4, 6], mean = 4, variance = (4+0+4)/3 = 8/3
        assert!((result[2].unwrap() - (8.0f64 / 3.0).sqrt()).abs() < 1e-10);
    }

    #[test]
    fn test_atr_wilder() {
        let atr = Atr::new(3);
        let high = vec![10.0, 11.0, 12.0, 11.0, 13.0, 14.0];
        let low = vec![8.0, 9.0, 10.0, 9.0, 11.0, 12.0];
        let close = vec![9.0, 10.0, 11.0, 10.0, 12.0, 13.0];

        let result = atr.calculate(&high, &low, &close);
        assert_eq!(result.len(), 6);
        assert!(result[..3].iter().all(Option::is_none));

        // True ranges from bar 1: 2, 2, 2, 3, 2
        assert!((result[3].unwrap() - 2.0).abs() < 1e-10);
        // (2 * 2 + 3) / 3
        assert!((result[4].unwrap() - 7.0 / 3.0).abs() < 1e-10);
        // (7/3 * 2 + 2) / 3
        assert!((result[5].unwrap() - (14.0 / 3.0 + 2.0) / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_atr_short_input() {
        let atr = Atr::new(14);
        let result = atr.calculate(&[1.0; 5], &[1.0; 5], &[1.0; 5]);
        assert_eq!(result, vec![None; 5]);
    }

    #[test]
    fn test_bollinger_bands() {
        let bb = BollingerBands::new();
        let data: Vec<f64> = (0..30)
            .map(|i| 100.0 + (i as f64 * 0.1).sin() * 5.0)
            .collect();

        let result = bb.calculate(&data);
        assert_eq!(result.len(), data.len());
        assert!(result[18].is_none());

        for output in result.iter().flatten() {
            // Upper > Middle > Lower
            assert!(output.upper > output.middle);
            assert!(output.middle > output.lower);
            assert!(output.bandwidth > 0.0);
        }
    }

    #[test]
    fn test_bollinger_percent_b() {
        let bb = BollingerBands::with_params(5, 2.0);
        let data = vec![100.0, 100.0, 100.0, 100.0, 100.0]; // Constant price

        let result = bb.calculate(&data);
        let last = result[4].unwrap();

        // With constant price, bands collapse, percent_b = 0.5
        assert!((last.percent_b - 0.5).abs() < 0.01);
        assert!((last.upper - last.lower).abs() < 1e-12);
    }

    #[test]
    fn test_bollinger_overbought_oversold() {
        let output = BollingerOutput {
            upper: 110.0,
            middle: 100.0,
            lower: 90.0,
            bandwidth: 0.2,
            percent_b: 0.5,
        };

        assert!(output.is_overbought(115.0));
        assert!(!output.is_overbought(105.0));
        assert!(output.is_oversold(85.0));
        assert!(!output.is_oversold(95.0));
    }
}
