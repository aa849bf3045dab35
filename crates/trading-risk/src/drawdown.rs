//! Portfolio drawdown guard with hysteresis.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Change in the guard's state after an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawdownTransition {
    Unchanged,
    /// Drawdown reached the maximum; entries are now vetoed
    Halted,
    /// Drawdown recovered below the resume threshold
    Resumed,
}

/// Running peak and drawdown tracker.
///
/// Halts when drawdown reaches `max_pct` and only resumes once it falls
/// below `resume_pct`, so equity hovering at the limit does not flap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownGuard {
    max_pct: Option<Decimal>,
    resume_pct: Decimal,
    peak_equity: Decimal,
    drawdown_pct: Decimal,
    halted: bool,
}

impl DrawdownGuard {
    /// `resume_pct` defaults to half of `max_pct`.
    pub fn new(initial_equity: Decimal, max_pct: Option<Decimal>, resume_pct: Option<Decimal>) -> Self {
        let resume_pct = resume_pct
            .or_else(|| max_pct.map(|m| m / dec!(2)))
            .unwrap_or(Decimal::ZERO);
        Self {
            max_pct,
            resume_pct,
            peak_equity: initial_equity,
            drawdown_pct: Decimal::ZERO,
            halted: false,
        }
    }

    /// Record the latest equity. Updates the peak on every call.
    pub fn update(&mut self, equity: Decimal) -> DrawdownTransition {
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        self.drawdown_pct = if self.peak_equity > Decimal::ZERO {
            (self.peak_equity - equity) / self.peak_equity * dec!(100)
        } else {
            Decimal::ZERO
        };

        let Some(max_pct) = self.max_pct else {
            return DrawdownTransition::Unchanged;
        };

        if !self.halted && self.drawdown_pct >= max_pct {
            self.halted = true;
            DrawdownTransition::Halted
        } else if self.halted && self.drawdown_pct < self.resume_pct {
            self.halted = false;
            DrawdownTransition::Resumed
        } else {
            DrawdownTransition::Unchanged
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn peak_equity(&self) -> Decimal {
        self.peak_equity
    }

    /// Current decline from the peak, in percent.
    pub fn drawdown_pct(&self) -> Decimal {
        self.drawdown_pct
    }

    pub fn max_pct(&self) -> Option<Decimal> {
        self.max_pct
    }

    pub fn resume_pct(&self) -> Decimal {
        self.resume_pct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_tracking() {
        let mut guard = DrawdownGuard::new(dec!(10000), None, None);
        guard.update(dec!(11000));
        guard.update(dec!(9900));

        assert_eq!(guard.peak_equity(), dec!(11000));
        assert_eq!(guard.drawdown_pct(), dec!(10));
        // No limit configured, never halts
        assert!(!guard.is_halted());
    }

    #[test]
    fn test_halt_and_resume_with_hysteresis() {
        let mut guard = DrawdownGuard::new(dec!(10000), Some(dec!(10)), None);
        assert_eq!(guard.resume_pct(), dec!(5));

        assert_eq!(guard.update(dec!(9500)), DrawdownTransition::Unchanged);
        assert_eq!(guard.update(dec!(9000)), DrawdownTransition::Halted);
        assert!(guard.is_halted());

        // Back inside the band but not below the resume threshold
        assert_eq!(guard.update(dec!(9400)), DrawdownTransition::Unchanged);
        assert!(guard.is_halted());

        assert_eq!(guard.update(dec!(9600)), DrawdownTransition::Resumed);
        assert!(!guard.is_halted());
    }

    #[test]
    fn test_explicit_resume_threshold() {
        let mut guard = DrawdownGuard::new(dec!(100), Some(dec!(20)), Some(dec!(2)));
        guard.update(dec!(80));
        assert!(guard.is_halted());
        guard.update(dec!(97));
        assert!(guard.is_halted());
        guard.update(dec!(99));
        assert!(!guard.is_halted());
    }
}
