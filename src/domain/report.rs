//! Final performance summary of a run.

use std::fmt;

use super::ledger::Ledger;

const RULE_WIDTH: usize = 55;

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub final_cash: f64,
    pub net_performance_pct: f64,
    pub trade_count: usize,
}

impl PerformanceSummary {
    /// Read the summary off a ledger that has been closed out.
    pub fn from_ledger(ledger: &Ledger) -> Self {
        PerformanceSummary {
            final_cash: ledger.cash(),
            net_performance_pct: ledger.performance_pct(),
            trade_count: ledger.trade_count(),
        }
    }
}

impl fmt::Display for PerformanceSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Final balance   [$] {:.2}", self.final_cash)?;
        writeln!(f, "Net performance [%] {:.2}", self.net_performance_pct)?;
        writeln!(f, "Trades Executed [#] {}", self.trade_count)?;
        write!(f, "{}", "=".repeat(RULE_WIDTH))
    }
}
