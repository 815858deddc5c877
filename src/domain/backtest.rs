//! Bar-by-bar simulation loop.
//!
//! The loop walks bars from the strategy's warm-up index to the last bar in
//! ascending order, evaluating the entry predicate while flat and the exit
//! predicate while long, and always finishes with a close-out on the last
//! bar. Ledger changes made at bar t are visible when bar t+1 is evaluated.

use chrono::NaiveDate;

use super::error::BacktestError;
use super::ledger::{CloseOutEvent, CostModel, Ledger, OrderSize};
use super::price_series::PriceSeries;
use super::report::PerformanceSummary;
use super::strategy::Strategy;
use crate::ports::trade_observer::TradeObserver;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_amount: f64,
    pub fixed_cost: f64,
    pub proportional_cost: f64,
    pub verbose: bool,
    pub strict: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_amount: 10_000.0,
            fixed_cost: 0.0,
            proportional_cost: 0.0,
            verbose: false,
            strict: false,
        }
    }
}

impl BacktestConfig {
    pub fn costs(&self) -> CostModel {
        CostModel::new(self.fixed_cost, self.proportional_cost)
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.initial_amount, self.costs()).with_strict(self.strict)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PositionState {
    #[default]
    Flat,
    Long,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: Strategy,
    pub summary: PerformanceSummary,
    /// Price change from the warm-up bar to the last bar, in percent.
    pub buy_and_hold_pct: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl BacktestResult {
    pub fn outperformance_pct(&self) -> f64 {
        self.summary.net_performance_pct - self.buy_and_hold_pct
    }
}

/// Run the FLAT/LONG state machine over `series` with one predicate pair.
///
/// Entries invest the full current cash; exits sell every unit held. An
/// entry a strict ledger cannot fund is skipped and the position stays flat.
/// The ledger is not reset here. Returns the final close-out.
pub fn simulate<E, X>(
    series: &PriceSeries,
    ledger: &mut Ledger,
    warmup: usize,
    enter: E,
    exit: X,
    mut observer: Option<&mut dyn TradeObserver>,
) -> Result<CloseOutEvent, BacktestError>
where
    E: Fn(usize) -> bool,
    X: Fn(usize) -> bool,
{
    if warmup >= series.len() {
        return Err(BacktestError::InsufficientWarmup {
            strategy: "simulation".into(),
            warmup,
            bars: series.len(),
        });
    }

    let mut state = PositionState::Flat;

    for bar in warmup..series.len() {
        let transition = match state {
            PositionState::Flat if enter(bar) => {
                let amount = ledger.cash();
                match ledger.buy(series, bar, OrderSize::Amount(amount)) {
                    Ok(event) => Some((event, PositionState::Long)),
                    // A strict ledger refuses entries the balance cannot pay for;
                    // the loop stays flat and keeps evaluating.
                    Err(BacktestError::InsufficientFunds {
                        required,
                        available,
                    }) => {
                        tracing::warn!(bar, required, available, "entry skipped");
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
            PositionState::Long if exit(bar) => {
                let units = ledger.units_held();
                let event = ledger.sell(series, bar, OrderSize::Units(units))?;
                Some((event, PositionState::Flat))
            }
            _ => None,
        };

        if let Some((event, next)) = transition {
            tracing::debug!(bar, side = %event.side, units = event.units, "position change");
            if let Some(obs) = observer.as_deref_mut() {
                obs.on_trade(&event);
            }
            state = next;
        }
    }

    let close = ledger.close_out(series, series.len() - 1)?;
    if let Some(obs) = observer.as_deref_mut() {
        obs.on_close_out(&close);
    }
    Ok(close)
}

/// Reset `ledger`, then run `strategy` over `series` to completion.
pub fn run_strategy(
    series: &PriceSeries,
    strategy: &Strategy,
    ledger: &mut Ledger,
    observer: Option<&mut dyn TradeObserver>,
) -> Result<BacktestResult, BacktestError> {
    let signals = strategy.signals(series)?;
    let warmup = strategy.warmup();

    let costs = ledger.costs();
    tracing::info!(
        strategy = %strategy,
        fixed_cost = costs.fixed,
        proportional_cost = costs.proportional,
        "running {} strategy",
        strategy.name()
    );

    ledger.reset();
    let close = simulate(
        series,
        ledger,
        warmup,
        |bar| signals.enter(bar),
        |bar| signals.exit(bar),
        observer,
    )?;

    let (start_date, entry_price) = series.date_price(warmup)?;
    let summary = PerformanceSummary::from_ledger(ledger);
    tracing::info!(
        strategy = %strategy,
        final_cash = summary.final_cash,
        trades = summary.trade_count,
        "run complete"
    );

    Ok(BacktestResult {
        strategy: *strategy,
        summary,
        buy_and_hold_pct: (close.price / entry_price - 1.0) * 100.0,
        start_date,
        end_date: close.date,
    })
}

/// One series and one ledger shared by any number of strategy runs. Each run
/// starts from a freshly reset ledger.
#[derive(Debug, Clone)]
pub struct BacktestEngine {
    series: PriceSeries,
    ledger: Ledger,
    verbose: bool,
}

impl BacktestEngine {
    pub fn new(series: PriceSeries, config: &BacktestConfig) -> Self {
        BacktestEngine {
            series,
            ledger: config.ledger(),
            verbose: config.verbose,
        }
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Trade events reach `observer` only when the engine is verbose.
    pub fn run(
        &mut self,
        strategy: &Strategy,
        observer: Option<&mut dyn TradeObserver>,
    ) -> Result<BacktestResult, BacktestError> {
        let observer = if self.verbose { observer } else { None };
        run_strategy(&self.series, strategy, &mut self.ledger, observer)
    }

    pub fn run_all(
        &mut self,
        strategies: &[Strategy],
        mut observer: Option<&mut dyn TradeObserver>,
    ) -> Result<Vec<BacktestResult>, BacktestError> {
        let mut results = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            results.push(self.run(strategy, reborrow(&mut observer))?);
        }
        Ok(results)
    }
}

fn reborrow<'s>(
    observer: &'s mut Option<&mut dyn TradeObserver>,
) -> Option<&'s mut dyn TradeObserver> {
    match observer {
        Some(obs) => Some(&mut **obs),
        None => None,
    }
}
