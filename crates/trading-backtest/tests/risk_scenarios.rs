//! Risk overrides observed through full engine runs.

mod common;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trading_backtest::{BacktestConfig, BacktestEngine};
use trading_core::types::{Bar, BarSeries, ExitReason, FillReason, Signal, Timeframe};
use trading_risk::{RiskConfig, StopLossMethod};

use common::{bar, AlwaysLong, DAY_MS};

fn run(config: BacktestConfig, bars: Vec<Bar>) -> trading_backtest::BacktestResult {
    let series = BarSeries::from_bars("RISK", Timeframe::Daily, bars);
    BacktestEngine::new(config).run(&AlwaysLong, &series).unwrap()
}

fn with_risk(risk: RiskConfig) -> BacktestConfig {
    BacktestConfig {
        risk,
        ..Default::default()
    }
}

#[test]
fn test_stop_loss_overrides_long_signal() {
    // Flat at 100, then bar 5 dips to 97.5 intrabar and closes at 99
    let mut bars: Vec<Bar> = (0..5).map(|i| bar(i, 100.0, 100.0)).collect();
    bars.push(Bar::new(5 * DAY_MS, 100.0, 100.5, 97.5, 99.0, 10_000.0));
    bars.extend((6..11).map(|i| bar(i, 99.0, 99.0)));

    let result = run(
        with_risk(RiskConfig {
            stop_loss: StopLossMethod::FixedPercent { percent: dec!(2) },
            ..Default::default()
        }),
        bars,
    );

    // The strategy wanted to be long on the breach bar
    assert_eq!(result.signals[5], Signal::Long);

    let first = &result.trades[0];
    assert_eq!(first.entry_index, 1);
    assert_eq!(first.entry_price, dec!(100));
    assert_eq!(first.exit_reason, ExitReason::StopLoss);
    assert_eq!(first.exit_index, 6);
    assert_eq!(first.exit_price, dec!(99));
    assert_eq!(first.net_pnl, dec!(-100));

    // Re-entered on the next signal, liquidated at the end
    assert_eq!(result.trades.len(), 2);
    assert_eq!(result.trades[1].entry_index, 7);
    assert_eq!(result.trades[1].exit_reason, ExitReason::EndOfData);
}

#[test]
fn test_trailing_stop_uses_level_in_force() {
    // Entry at 100 with a 5% trailing stop; the close of 110 lifts it to 104.5
    let closes = [100.0, 100.0, 105.0, 110.0, 108.0, 104.0, 104.0, 104.0];
    let result = run(
        with_risk(RiskConfig {
            stop_loss: StopLossMethod::TrailingPercent { percent: dec!(5) },
            ..Default::default()
        }),
        common::bars_from_closes(&closes),
    );

    let first = &result.trades[0];
    assert_eq!(first.exit_reason, ExitReason::StopLoss);
    // Bar 5 trades down to 103.5, below 104.5; exit at the next open
    assert_eq!(first.exit_index, 6);
    assert_eq!(first.exit_price, dec!(104));
}

#[test]
fn test_drawdown_halt_blocks_reentry() {
    let mut closes = vec![100.0; 5];
    closes.extend([98.0, 96.0, 94.0, 92.0, 90.0]);
    closes.extend((1..=30).map(|i| 90.0 + i as f64));

    let result = run(
        with_risk(RiskConfig {
            max_drawdown_pct: Some(dec!(10)),
            ..Default::default()
        }),
        common::bars_from_closes(&closes),
    );

    // Bar 9 marks equity at 9000, a 10% drawdown from 10000
    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::Drawdown);
    assert_eq!(trade.exit_index, 10);
    assert_eq!(trade.exit_price, dec!(90));

    // The strategy kept asking to go long while the price recovered
    assert!(result.signals[10..].iter().all(|s| *s == Signal::Long));
    assert_eq!(result.fills.len(), 2);
    assert!(result
        .fills
        .iter()
        .all(|f| f.bar_index <= 10 || f.reason != FillReason::Entry));
    assert_eq!(result.report.final_equity, dec!(9000));
}

#[test]
fn test_entry_skipped_without_cash() {
    // Price above the whole account: nothing can be bought
    let closes = [20_000.0; 6];
    let result = run(BacktestConfig::default(), common::bars_from_closes(&closes));

    assert!(result.trades.is_empty());
    assert!(result.fills.is_empty());
    assert_eq!(result.skipped_bars, vec![1, 2, 3, 4]);
    assert!(result
        .equity_curve
        .iter()
        .all(|p| p.equity == Decimal::new(10_000, 0)));
}

#[test]
fn test_atr_stop_waits_for_atr_and_then_protects() {
    // 16 flat bars (true range 1), then a slide from 100 to 40
    let mut closes = vec![100.0; 16];
    closes.extend((1..=30).map(|i| 100.0 - 2.0 * i as f64));
    let last = closes.len() - 1;

    let result = run(
        with_risk(RiskConfig {
            stop_loss: StopLossMethod::Atr { multiplier: dec!(2) },
            atr_period: 14,
            ..Default::default()
        }),
        common::bars_from_closes(&closes),
    );

    // ATR(14) is first defined on bar 14; earlier long signals are held
    assert!(result.signals[..14].iter().all(|s| *s == Signal::Long));
    assert_eq!(result.fills[0].bar_index, 15);
    assert!(result.skipped_bars.is_empty());

    // Stop at 100 - 2 * 1 = 98, reached by bar 16's low of 97.5
    let first = &result.trades[0];
    assert_eq!(first.entry_index, 15);
    assert_eq!(first.entry_price, dec!(100));
    assert_eq!(first.exit_reason, ExitReason::StopLoss);
    assert_eq!(first.exit_index, 17);
    assert_eq!(first.exit_price, dec!(98));

    // Every later position is stopped out too, well before the slide bottoms
    assert_eq!(result.trades.len(), 9);
    assert!(result
        .trades
        .iter()
        .all(|t| t.exit_reason == ExitReason::StopLoss || t.exit_index == last));
    assert!(result
        .trades
        .iter()
        .all(|t| t.entry_price - t.exit_price <= dec!(6)));
}
