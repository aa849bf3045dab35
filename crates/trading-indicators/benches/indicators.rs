//! Benchmarks for indicator implementations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trading_core::traits::{Indicator, MultiOutputIndicator, OhlcvIndicator};
use trading_indicators::{simd, Atr, BollingerBands, Ema, Macd, Rsi, Sma};

fn generate_test_data(size: usize) -> Vec<f64> {
    (0..size)
        .map(|i| 100.0 + (i as f64 * 0.1).sin() * 10.0)
        .collect()
}

fn benchmark_moving_averages(c: &mut Criterion) {
    let mut group = c.benchmark_group("MovingAverage");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("sma", size), &data, |b, data| {
            let sma = Sma::new(20);
            b.iter(|| sma.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("ema", size), &data, |b, data| {
            let ema = Ema::new(20);
            b.iter(|| ema.calculate(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_rsi(c: &mut Criterion) {
    let mut group = c.benchmark_group("RSI");

    for size in [1000, 10000, 100000].iter() {
        let data = generate_test_data(*size);

        group.bench_with_input(BenchmarkId::new("wilder", size), &data, |b, data| {
            let rsi = Rsi::new(14);
            b.iter(|| rsi.calculate(black_box(data)))
        });

        group.bench_with_input(BenchmarkId::new("gains_losses", size), &data, |b, data| {
            b.iter(|| simd::gains_losses_simd(black_box(data)))
        });
    }

    group.finish();
}

fn benchmark_volatility(c: &mut Criterion) {
    let mut group = c.benchmark_group("Volatility");

    for size in [1000, 10000, 100000].iter() {
        let close = generate_test_data(*size);
        let high: Vec<f64> = close.iter().map(|c| c + 1.0).collect();
        let low: Vec<f64> = close.iter().map(|c| c - 1.0).collect();

        group.bench_with_input(BenchmarkId::new("std_dev", size), &close, |b, data| {
            b.iter(|| simd::std_dev_simd(black_box(data), black_box(20)))
        });

        group.bench_with_input(BenchmarkId::new("bollinger", size), &close, |b, data| {
            let bb = BollingerBands::new();
            b.iter(|| bb.calculate(black_box(data)))
        });

        group.bench_function(BenchmarkId::new("atr", size), |b| {
            let atr = Atr::new(14);
            b.iter(|| atr.calculate(black_box(&high), black_box(&low), black_box(&close)))
        });
    }

    group.finish();
}

fn benchmark_macd(c: &mut Criterion) {
    let data = generate_test_data(100000);
    let macd = Macd::new();
    c.bench_function("MACD/100000", |b| b.iter(|| macd.calculate(black_box(&data))));
}

criterion_group!(
    benches,
    benchmark_moving_averages,
    benchmark_rsi,
    benchmark_volatility,
    benchmark_macd
);
criterion_main!(benches);
