//! Backtest report generation.

use crate::engine::BacktestResult;
use crate::statistics::PerformanceReport;

impl PerformanceReport {
    /// Generate a text summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("PERFORMANCE\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Initial Capital:     ${:.2}\n", self.initial_equity));
        s.push_str(&format!("  Final Equity:        ${:.2}\n", self.final_equity));
        s.push_str(&format!("  Total Return:        {:.2}%\n", self.total_return_pct));
        s.push_str(&format!("  CAGR:                {:.2}%\n", self.cagr_pct));
        s.push_str(&format!("  Max Drawdown:        {:.2}%\n", self.max_drawdown_pct));
        s.push('\n');

        s.push_str("RISK METRICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Sharpe Ratio:        {:.2}\n", self.sharpe_ratio));
        s.push_str(&format!("  Sortino Ratio:       {:.2}\n", self.sortino_ratio));
        match self.profit_factor {
            Some(pf) => s.push_str(&format!("  Profit Factor:       {:.2}\n", pf)),
            None => s.push_str("  Profit Factor:       n/a\n"),
        }
        s.push_str(&format!("  Exposure:            {:.1}%\n", self.exposure_pct));
        s.push('\n');

        s.push_str("TRADE STATISTICS\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Total Trades:        {}\n", self.total_trades));
        s.push_str(&format!("  Winning Trades:      {}\n", self.winning_trades));
        s.push_str(&format!("  Losing Trades:       {}\n", self.losing_trades));
        s.push_str(&format!("  Win Rate:            {:.2}%\n", self.win_rate_pct));
        s.push_str(&format!("  Avg Win:             ${:.2}\n", self.avg_win));
        s.push_str(&format!("  Avg Loss:            ${:.2}\n", self.avg_loss));
        s.push_str(&format!("  Commission Paid:     ${:.2}\n", self.total_commission));
        s.push_str(&format!("  Slippage Cost:       ${:.2}\n", self.total_slippage));
        s.push('\n');

        s.push_str("EXECUTION\n");
        s.push_str("───────────────────────────────────────────────────────────\n");
        s.push_str(&format!("  Bars Processed:      {}\n", self.bars));
        s.push_str(&format!("  Equity Points:       {}\n", self.equity_curve.len()));

        s
    }
}

impl BacktestResult {
    /// Summary with a header naming the run.
    pub fn summary(&self) -> String {
        let mut s = String::new();

        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str("                     BACKTEST REPORT                        \n");
        s.push_str("═══════════════════════════════════════════════════════════\n");
        s.push_str(&format!(
            "  Strategy: {}   Symbol: {}   Timeframe: {}\n\n",
            self.strategy, self.symbol, self.timeframe
        ));
        s.push_str(&self.report.summary());
        if !self.skipped_bars.is_empty() {
            s.push_str(&format!("  Skipped Bars:        {}\n", self.skipped_bars.len()));
        }
        s.push_str("═══════════════════════════════════════════════════════════\n");

        s
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
