//! Performance statistics over a completed run.

use num_traits::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use trading_core::{
    to_f64,
    types::{EquityPoint, Timeframe, Trade},
};

/// Performance report for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Starting capital
    pub initial_equity: Decimal,
    /// Equity after the last bar
    pub final_equity: Decimal,
    /// Total return percentage
    pub total_return_pct: Decimal,
    /// Compound annual growth rate, percent
    pub cagr_pct: f64,
    /// Annualised Sharpe ratio
    pub sharpe_ratio: f64,
    /// Annualised Sortino ratio
    pub sortino_ratio: f64,
    /// Largest peak-to-trough decline, percent
    pub max_drawdown_pct: Decimal,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Win rate percentage
    pub win_rate_pct: f64,
    /// Average net profit per winning trade
    pub avg_win: Decimal,
    /// Average net loss per losing trade, as a positive amount
    pub avg_loss: Decimal,
    /// Gross profit / gross loss; `None` without losing trades
    pub profit_factor: Option<f64>,
    pub total_commission: Decimal,
    pub total_slippage: Decimal,
    /// Share of bars with an open position, percent
    pub exposure_pct: f64,
    /// Number of bars processed
    pub bars: usize,
    /// Annualisation factor used
    pub bars_per_year: f64,
    /// Equity curve
    pub equity_curve: Vec<EquityPoint>,
}

/// Computes [`PerformanceReport`]s. Stateless and deterministic.
#[derive(Debug, Clone, Copy)]
pub struct PerformanceAnalyzer {
    bars_per_year: f64,
    /// Annual risk-free rate as a fraction (0.02 = 2%)
    risk_free_rate: f64,
}

impl PerformanceAnalyzer {
    pub fn new(bars_per_year: f64, risk_free_rate: f64) -> Self {
        Self {
            bars_per_year,
            risk_free_rate,
        }
    }

    pub fn for_timeframe(timeframe: Timeframe, risk_free_rate: f64) -> Self {
        Self::new(timeframe.periods_per_year(), risk_free_rate)
    }

    pub fn analyze(
        &self,
        initial_equity: Decimal,
        equity_curve: &[EquityPoint],
        trades: &[Trade],
    ) -> PerformanceReport {
        let final_equity = equity_curve.last().map_or(initial_equity, |p| p.equity);
        let total_return_pct = if initial_equity > Decimal::ZERO {
            (final_equity - initial_equity) / initial_equity * dec!(100)
        } else {
            Decimal::ZERO
        };

        let returns = period_returns(equity_curve);
        let per_bar_rf = self.risk_free_rate / self.bars_per_year;
        let excess: Vec<f64> = returns.iter().map(|r| r - per_bar_rf).collect();

        let mut total_profit = Decimal::ZERO;
        let mut total_loss = Decimal::ZERO;
        let mut winning_trades = 0;
        let mut losing_trades = 0;
        for trade in trades {
            if trade.is_winner() {
                winning_trades += 1;
                total_profit += trade.net_pnl;
            } else if trade.is_loser() {
                losing_trades += 1;
                total_loss += trade.net_pnl.abs();
            }
        }

        let exposed = equity_curve
            .iter()
            .filter(|p| !p.position_value.is_zero())
            .count();

        PerformanceReport {
            initial_equity,
            final_equity,
            total_return_pct,
            cagr_pct: self.cagr_pct(initial_equity, final_equity, equity_curve.len()),
            sharpe_ratio: self.sharpe(&excess),
            sortino_ratio: self.sortino(&excess),
            max_drawdown_pct: max_drawdown_pct(initial_equity, equity_curve),
            total_trades: trades.len(),
            winning_trades,
            losing_trades,
            win_rate_pct: ratio_pct(winning_trades, trades.len()),
            avg_win: average(total_profit, winning_trades),
            avg_loss: average(total_loss, losing_trades),
            profit_factor: if total_loss > Decimal::ZERO {
                (total_profit / total_loss).to_f64()
            } else {
                None
            },
            total_commission: trades.iter().map(|t| t.commission).sum(),
            total_slippage: trades.iter().map(|t| t.slippage).sum(),
            exposure_pct: ratio_pct(exposed, equity_curve.len()),
            bars: equity_curve.len(),
            bars_per_year: self.bars_per_year,
            equity_curve: equity_curve.to_vec(),
        }
    }

    fn cagr_pct(&self, initial: Decimal, final_equity: Decimal, bars: usize) -> f64 {
        if bars == 0 || initial <= Decimal::ZERO || self.bars_per_year <= 0.0 {
            return 0.0;
        }
        if final_equity <= Decimal::ZERO {
            return -100.0;
        }
        let years = bars as f64 / self.bars_per_year;
        let growth = to_f64(final_equity) / to_f64(initial);
        (growth.powf(1.0 / years) - 1.0) * 100.0
    }

    /// Mean excess return over its sample standard deviation, annualised.
    fn sharpe(&self, excess: &[f64]) -> f64 {
        if excess.len() < 2 {
            return 0.0;
        }
        let mean = excess.iter().copied().mean();
        let std_dev = excess.iter().copied().std_dev();
        if !std_dev.is_finite() || std_dev == 0.0 {
            return 0.0;
        }
        mean / std_dev * self.bars_per_year.sqrt()
    }

    /// Like Sharpe, with downside deviation over all returns in the denominator.
    fn sortino(&self, excess: &[f64]) -> f64 {
        if excess.is_empty() {
            return 0.0;
        }
        let mean = excess.iter().copied().mean();
        let downside =
            excess.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / excess.len() as f64;
        let downside_dev = downside.sqrt();
        if downside_dev == 0.0 {
            return 0.0;
        }
        mean / downside_dev * self.bars_per_year.sqrt()
    }
}

/// Bar-over-bar simple returns of the equity curve.
pub fn period_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = to_f64(w[0].equity);
            if prev == 0.0 {
                0.0
            } else {
                to_f64(w[1].equity) / prev - 1.0
            }
        })
        .collect()
}

/// Largest decline from a running peak, seeded with the starting equity.
pub fn max_drawdown_pct(initial_equity: Decimal, equity_curve: &[EquityPoint]) -> Decimal {
    let mut peak = initial_equity;
    let mut max_dd = Decimal::ZERO;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > Decimal::ZERO {
            let dd = (peak - point.equity) / peak * dec!(100);
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

fn ratio_pct(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}
