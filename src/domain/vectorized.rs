//! Whole-series evaluation of the long-only strategies.
//!
//! Instead of stepping a ledger, positions for every bar are derived in one
//! pass from the same entry/exit predicates the event loop uses, and
//! performance is computed in log-return space:
//!
//! strategy[t] = position[t-1] * r[t] - tc * (position[t] != position[t-1])
//!
//! With zero costs the result tracks the event loop's final cash up to the
//! fractional units the loop cannot buy.

use super::error::BacktestError;
use super::price_series::PriceSeries;
use super::strategy::Strategy;

#[derive(Debug, Clone, PartialEq)]
pub struct VectorizedResult {
    /// Position (true = long) for each bar from the warm-up index onward.
    pub positions: Vec<bool>,
    /// Number of position changes, including the first entry.
    pub trades: usize,
    /// Final strategy value, rounded to cents.
    pub absolute: f64,
    /// Strategy value minus buy-and-hold value, rounded to cents.
    pub outperformance: f64,
}

pub fn run_vectorized(
    series: &PriceSeries,
    strategy: &Strategy,
    amount: f64,
    tc: f64,
) -> Result<VectorizedResult, BacktestError> {
    let signals = strategy.signals(series)?;
    let warmup = strategy.warmup();
    let returns = series.returns();

    let mut positions = Vec::with_capacity(series.len() - warmup);
    let mut held = false;
    for bar in warmup..series.len() {
        held = if held {
            !signals.exit(bar)
        } else {
            signals.enter(bar)
        };
        positions.push(held);
    }

    let mut trades = 0usize;
    let mut strategy_log = 0.0;
    let mut previous = false;
    for (offset, &position) in positions.iter().enumerate() {
        let bar = warmup + offset;
        if offset > 0 && previous {
            strategy_log += returns[bar];
        }
        if position != previous {
            trades += 1;
            strategy_log -= tc;
        }
        previous = position;
    }

    let market_log: f64 = returns[warmup + 1..].iter().sum();
    let absolute = amount * strategy_log.exp();
    let benchmark = amount * market_log.exp();

    Ok(VectorizedResult {
        positions,
        trades,
        absolute: round_cents(absolute),
        outperformance: round_cents(absolute - benchmark),
    })
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
