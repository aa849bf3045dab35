//! Full runs over synthetic series with known outcomes.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trading_backtest::{BacktestConfig, BacktestEngine, EngineState};
use trading_core::traits::{Indicator, Strategy};
use trading_core::types::{to_decimal, ExitReason, PositionSide, Signal};
use trading_indicators::Sma;
use trading_strategies::{SmaCrossoverConfig, SmaCrossoverStrategy};

fn crossover(fast: usize, slow: usize) -> SmaCrossoverStrategy {
    SmaCrossoverStrategy::new(SmaCrossoverConfig {
        fast_period: fast,
        slow_period: slow,
        ..Default::default()
    })
}

/// Down for 30 bars, up for 35, down for 35.
fn down_up_down() -> Vec<f64> {
    (0..100)
        .map(|i| {
            if i < 30 {
                100.0 - i as f64
            } else if i < 65 {
                71.0 + (i - 29) as f64 * 1.5
            } else {
                123.5 - (i - 64) as f64 * 1.5
            }
        })
        .collect()
}

/// First bar at or after `from` where `fast` crosses `slow` in the given direction.
fn find_cross(fast: &[Option<f64>], slow: &[Option<f64>], from: usize, upward: bool) -> usize {
    (from.max(1)..fast.len())
        .find(|&t| {
            let (Some(f), Some(s), Some(pf), Some(ps)) = (fast[t], slow[t], fast[t - 1], slow[t - 1])
            else {
                return false;
            };
            if upward {
                pf <= ps && f > s
            } else {
                pf >= ps && f < s
            }
        })
        .unwrap()
}

#[test]
fn test_warmup_gating_with_19_bars() {
    let closes: Vec<f64> = (0..19).map(|i| 100.0 + (i as f64 * 0.9).sin() * 5.0).collect();
    let series = common::series(&closes);
    let strategy = crossover(5, 20);

    let frame = strategy.compute_indicators(series.bars()).unwrap();
    for i in 0..series.len() {
        assert_eq!(
            strategy.generate_signal(series.bars(), &frame, i, PositionSide::Flat),
            Signal::Hold
        );
    }

    let mut engine = BacktestEngine::new(BacktestConfig::default());
    let result = engine.run(&strategy, &series).unwrap();
    assert_eq!(engine.state(), EngineState::Completed);
    assert!(result.signals.iter().all(|s| *s == Signal::Hold));
    assert!(result.fills.is_empty());
    assert_eq!(result.equity_curve.len(), 19);
    assert_eq!(result.report.final_equity, dec!(10000));
}

#[test]
fn test_single_round_trip() {
    let closes = down_up_down();
    let series = common::series(&closes);
    let bars = series.bars();

    let fast = Sma::new(5).calculate(&closes);
    let slow = Sma::new(20).calculate(&closes);
    let cross_up = find_cross(&fast, &slow, 20, true);
    let cross_down = find_cross(&fast, &slow, cross_up + 1, false);
    assert!(cross_up > 29 && cross_up < 65);
    assert!(cross_down > 64);

    let mut engine = BacktestEngine::new(BacktestConfig::default());
    let result = engine.run(&crossover(5, 20), &series).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];

    let entry_open = to_decimal(bars[cross_up + 1].open).unwrap();
    let exit_open = to_decimal(bars[cross_down + 1].open).unwrap();
    assert_eq!(trade.entry_index, cross_up + 1);
    assert_eq!(trade.exit_index, cross_down + 1);
    assert_eq!(trade.entry_price, entry_open);
    assert_eq!(trade.exit_price, exit_open);
    assert_eq!(trade.exit_reason, ExitReason::Signal);
    assert_eq!(trade.quantity, (dec!(10000) / entry_open).floor());
    assert_eq!(trade.gross_pnl, (exit_open - entry_open) * trade.quantity);
    assert_eq!(trade.commission, Decimal::ZERO);

    // Final equity is starting cash plus the trade's P&L, exactly
    assert_eq!(result.report.final_equity, dec!(10000) + trade.net_pnl);
    assert_eq!(result.equity_curve.len(), 100);
    assert_eq!(result.report.total_trades, 1);
    assert!(result.skipped_bars.is_empty());
}

#[test]
fn test_identical_runs_are_identical() {
    let series = common::series(&down_up_down());
    let config = BacktestConfig::default();

    let a = BacktestEngine::new(config.clone()).run(&crossover(5, 20), &series).unwrap();
    let b = BacktestEngine::new(config).run(&crossover(5, 20), &series).unwrap();

    assert_eq!(a.signals, b.signals);
    assert_eq!(a.trades, b.trades);
    assert_eq!(a.equity_curve, b.equity_curve);
    assert_eq!(a.report, b.report);
}
