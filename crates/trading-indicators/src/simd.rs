//! SIMD-optimized kernels shared by the indicators.
//!
//! These use the `wide` crate for portable SIMD operations. Kernels return
//! dense values; the indicator types take care of aligning them to the input.

use wide::f64x4;

/// SIMD-optimized sum of a slice.
pub fn sum_simd(data: &[f64]) -> f64 {
    let chunks = data.len() / 4;
    let mut simd_sum = f64x4::splat(0.0);

    for i in 0..chunks {
        let idx = i * 4;
        let values = f64x4::new([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        simd_sum += values;
    }

    let mut result = simd_sum.reduce_add();

    // Handle remaining elements
    for &value in &data[(chunks * 4)..] {
        result += value;
    }

    result
}

/// Sum of squared deviations from `mean`.
pub fn sum_sq_dev_simd(window: &[f64], mean: f64) -> f64 {
    let chunks = window.len() / 4;
    let mean_vec = f64x4::splat(mean);
    let mut sum_sq = 0.0;

    for i in 0..chunks {
        let idx = i * 4;
        let values = f64x4::new([
            window[idx],
            window[idx + 1],
            window[idx + 2],
            window[idx + 3],
        ]);
        let diff = values - mean_vec;
        sum_sq += (diff * diff).reduce_add();
    }

    for &value in &window[(chunks * 4)..] {
        let diff = value - mean;
        sum_sq += diff * diff;
    }

    sum_sq
}

/// Rolling population standard deviation, one value per full window.
pub fn std_dev_simd(data: &[f64], period: usize) -> Vec<f64> {
    if data.len() < period || period == 0 {
        return vec![];
    }

    let period_f64 = period as f64;
    data.windows(period)
        .map(|window| {
            let mean = sum_simd(window) / period_f64;
            (sum_sq_dev_simd(window, mean) / period_f64).sqrt()
        })
        .collect()
}

/// Per-step gains and losses of a price series (`data.len() - 1` entries each).
pub fn gains_losses_simd(data: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if data.len() < 2 {
        return (vec![], vec![]);
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    let chunks = (data.len() - 1) / 4;
    let zero = f64x4::splat(0.0);

    for i in 0..chunks {
        let idx = i * 4;
        let prev = f64x4::new([data[idx], data[idx + 1], data[idx + 2], data[idx + 3]]);
        let curr = f64x4::new([
            data[idx + 1],
            data[idx + 2],
            data[idx + 3],
            data[idx + 4],
        ]);

        let diff = curr - prev;
        gains.extend(diff.max(zero).to_array());
        losses.extend((-diff).max(zero).to_array());
    }

    for i in (chunks * 4)..(data.len() - 1) {
        let change = data[i + 1] - data[i];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    (gains, losses)
}

/// True range per bar. The first bar has no previous close, so it uses high - low.
pub fn true_range_simd(high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
    let len = high.len().min(low.len()).min(close.len());
    if len == 0 {
        return vec![];
    }

    let mut result = Vec::with_capacity(len);
    result.push(high[0] - low[0]);

    let chunks = (len - 1) / 4;
    for i in 0..chunks {
        let idx = i * 4 + 1;
        let h = f64x4::new([high[idx], high[idx + 1], high[idx + 2], high[idx + 3]]);
        let l = f64x4::new([low[idx], low[idx + 1], low[idx + 2], low[idx + 3]]);
        let pc = f64x4::new([
            close[idx - 1],
            close[idx],
            close[idx + 1],
            close[idx + 2],
        ]);

        let tr = (h - l).max((h - pc).abs()).max((l - pc).abs());
        result.extend(tr.to_array());
    }

    for i in (chunks * 4 + 1)..len {
        let hl = high[i] - low[i];
        let hc = (high[i] - close[i - 1]).abs();
        let lc = (low[i] - close[i - 1]).abs();
        result.push(hl.max(hc).max(lc));
    }

    result
}
