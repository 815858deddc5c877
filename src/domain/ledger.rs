//! Cash and position accounting under a transaction cost model.
//!
//! The `Ledger` owns cash, units held and the trade count. All three change
//! only through `buy`, `sell`, `close_out` and `reset`.

use chrono::NaiveDate;
use std::fmt;

use super::error::BacktestError;
use super::price_series::PriceSeries;

/// Fixed cost per trade plus a fraction of trade notional.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CostModel {
    pub fixed: f64,
    pub proportional: f64,
}

impl CostModel {
    pub fn new(fixed: f64, proportional: f64) -> Self {
        CostModel {
            fixed,
            proportional,
        }
    }

    /// Cash paid for a buy: units * price * (1 + ptc) + ftc.
    pub fn buy_debit(&self, units: f64, price: f64) -> f64 {
        units * price * (1.0 + self.proportional) + self.fixed
    }

    /// Cash received for a sell: units * price * (1 - ptc) - ftc.
    pub fn sell_credit(&self, units: f64, price: f64) -> f64 {
        units * price * (1.0 - self.proportional) - self.fixed
    }
}

/// How an order is sized: a unit count, or a cash amount converted to whole
/// units at the bar's price.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OrderSize {
    Units(f64),
    Amount(f64),
}

impl OrderSize {
    /// Exactly one of `units` or `amount` must be given.
    pub fn from_options(units: Option<f64>, amount: Option<f64>) -> Result<Self, BacktestError> {
        match (units, amount) {
            (Some(u), None) => Ok(OrderSize::Units(u)),
            (None, Some(a)) => Ok(OrderSize::Amount(a)),
            (Some(_), Some(_)) => Err(BacktestError::InvalidOrder {
                reason: "both units and amount given".into(),
            }),
            (None, None) => Err(BacktestError::InvalidOrder {
                reason: "neither units nor amount given".into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

/// Emitted once per buy or sell.
#[derive(Debug, Clone, PartialEq)]
pub struct TradeEvent {
    pub date: NaiveDate,
    pub side: Side,
    pub units: f64,
    pub price: f64,
    pub resulting_cash: f64,
    pub resulting_net_wealth: f64,
}

/// Emitted by the end-of-period liquidation.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseOutEvent {
    pub date: NaiveDate,
    pub units: f64,
    pub price: f64,
    pub resulting_cash: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    initial_amount: f64,
    cash: f64,
    units_held: f64,
    trade_count: usize,
    costs: CostModel,
    strict: bool,
}

impl Ledger {
    pub fn new(initial_amount: f64, costs: CostModel) -> Self {
        Ledger {
            initial_amount,
            cash: initial_amount,
            units_held: 0.0,
            trade_count: 0,
            costs,
            strict: false,
        }
    }

    /// In strict mode buys may not overdraw cash and sells may not exceed
    /// the units held. Amount-sized buys are sized net of costs so that a
    /// full-cash entry still fits.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn reset(&mut self) {
        self.cash = self.initial_amount;
        self.units_held = 0.0;
        self.trade_count = 0;
    }

    pub fn initial_amount(&self) -> f64 {
        self.initial_amount
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn units_held(&self) -> f64 {
        self.units_held
    }

    pub fn trade_count(&self) -> usize {
        self.trade_count
    }

    pub fn costs(&self) -> CostModel {
        self.costs
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn buy(
        &mut self,
        series: &PriceSeries,
        bar: usize,
        size: OrderSize,
    ) -> Result<TradeEvent, BacktestError> {
        let (date, price) = series.date_price(bar)?;
        let units = self.resolve_units(size, price, Side::Buy)?;
        let debit = self.costs.buy_debit(units, price);

        if self.strict && debit > self.cash {
            return Err(BacktestError::InsufficientFunds {
                required: debit,
                available: self.cash,
            });
        }

        self.cash -= debit;
        self.units_held += units;
        self.trade_count += 1;

        Ok(self.event(date, Side::Buy, units, price))
    }

    pub fn sell(
        &mut self,
        series: &PriceSeries,
        bar: usize,
        size: OrderSize,
    ) -> Result<TradeEvent, BacktestError> {
        let (date, price) = series.date_price(bar)?;
        let units = self.resolve_units(size, price, Side::Sell)?;

        if self.strict && units > self.units_held {
            return Err(BacktestError::InsufficientUnits {
                requested: units,
                held: self.units_held,
            });
        }

        self.cash += self.costs.sell_credit(units, price);
        self.units_held -= units;
        self.trade_count += 1;

        Ok(self.event(date, Side::Sell, units, price))
    }

    /// Liquidate everything at the bar's price. No transaction cost is
    /// charged, and the call counts as a trade even when nothing is held.
    pub fn close_out(&mut self, series: &PriceSeries, bar: usize) -> Result<CloseOutEvent, BacktestError> {
        let (date, price) = series.date_price(bar)?;
        let units = self.units_held;

        self.cash += units * price;
        self.units_held = 0.0;
        self.trade_count += 1;

        Ok(CloseOutEvent {
            date,
            units,
            price,
            resulting_cash: self.cash,
        })
    }

    pub fn net_wealth(&self, series: &PriceSeries, bar: usize) -> Result<f64, BacktestError> {
        let (_, price) = series.date_price(bar)?;
        Ok(self.mark_to_market(price))
    }

    /// Percentage gain of cash over the initial amount. Only meaningful once
    /// the position has been closed out.
    pub fn performance_pct(&self) -> f64 {
        (self.cash - self.initial_amount) / self.initial_amount * 100.0
    }

    fn mark_to_market(&self, price: f64) -> f64 {
        self.cash + self.units_held * price
    }

    fn resolve_units(&self, size: OrderSize, price: f64, side: Side) -> Result<f64, BacktestError> {
        match size {
            OrderSize::Units(units) => {
                if !units.is_finite() || units < 0.0 {
                    return Err(BacktestError::InvalidOrder {
                        reason: format!("units must be a non-negative number, got {}", units),
                    });
                }
                Ok(units)
            }
            OrderSize::Amount(amount) => {
                if !amount.is_finite() {
                    return Err(BacktestError::InvalidOrder {
                        reason: format!("amount must be finite, got {}", amount),
                    });
                }
                if !(self.strict && side == Side::Buy) {
                    // An overdrawn balance buys nothing rather than a negative lot.
                    return Ok((amount / price).floor().max(0.0));
                }

                let spendable = (amount - self.costs.fixed) / (1.0 + self.costs.proportional);
                let mut units = (spendable / price).floor().max(0.0);
                // The debit of a whole lot can round a few ulps above `amount`.
                while units > 0.0 && self.costs.buy_debit(units, price) > amount {
                    units -= 1.0;
                }
                Ok(units)
            }
        }
    }

    fn event(&self, date: NaiveDate, side: Side, units: f64, price: f64) -> TradeEvent {
        TradeEvent {
            date,
            side,
            units,
            price,
            resulting_cash: self.cash,
            resulting_net_wealth: self.mark_to_market(price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::from_observations(
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| (start + chrono::Duration::days(i as i64), p))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn new_ledger() {
        let ledger = Ledger::new(1000.0, CostModel::default());
        assert!((ledger.cash() - 1000.0).abs() < f64::EPSILON);
        assert_eq!(ledger.units_held(), 0.0);
        assert_eq!(ledger.trade_count(), 0);
        assert!(!ledger.is_strict());
    }

    #[test]
    fn order_size_requires_exactly_one() {
        assert_eq!(
            OrderSize::from_options(Some(3.0), None).unwrap(),
            OrderSize::Units(3.0)
        );
        assert_eq!(
            OrderSize::from_options(None, Some(500.0)).unwrap(),
            OrderSize::Amount(500.0)
        );
        assert!(matches!(
            OrderSize::from_options(Some(1.0), Some(1.0)),
            Err(BacktestError::InvalidOrder { .. })
        ));
        assert!(matches!(
            OrderSize::from_options(None, None),
            Err(BacktestError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn buy_by_amount_floors_units() {
        // bar 0 price = 102
        let s = series(&[100.0, 102.0, 110.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default());
        let ev = ledger.buy(&s, 0, OrderSize::Amount(1000.0)).unwrap();

        assert_eq!(ev.units, 9.0);
        assert_eq!(ev.side, Side::Buy);
        assert!((ledger.cash() - (1000.0 - 918.0)).abs() < 1e-9);
        assert_eq!(ledger.units_held(), 9.0);
        assert_eq!(ledger.trade_count(), 1);
        assert!((ev.resulting_net_wealth - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn buy_applies_costs() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::new(10.0, 0.01));
        ledger.buy(&s, 0, OrderSize::Units(5.0)).unwrap();
        // 5 * 100 * 1.01 + 10 = 515
        assert!((ledger.cash() - 485.0).abs() < 1e-9);
    }

    #[test]
    fn sell_applies_costs() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::new(10.0, 0.01));
        ledger.buy(&s, 0, OrderSize::Units(5.0)).unwrap();
        let ev = ledger.sell(&s, 0, OrderSize::Units(5.0)).unwrap();
        // 485 + 5 * 100 * 0.99 - 10 = 970
        assert!((ledger.cash() - 970.0).abs() < 1e-9);
        assert_eq!(ledger.units_held(), 0.0);
        assert_eq!(ledger.trade_count(), 2);
        assert_eq!(ev.side, Side::Sell);
    }

    #[test]
    fn permissive_buy_can_overdraw() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::new(10.0, 0.01));
        ledger.buy(&s, 0, OrderSize::Amount(1000.0)).unwrap();
        // 10 units * 101 + 10 = 1020
        assert!((ledger.cash() - (-20.0)).abs() < 1e-9);
    }

    #[test]
    fn negative_amount_buys_nothing() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default());
        let ev = ledger.buy(&s, 0, OrderSize::Amount(-20.0)).unwrap();
        assert_eq!(ev.units, 0.0);
        assert_eq!(ledger.trade_count(), 1);
    }

    #[test]
    fn permissive_sell_of_unheld_units() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default());
        ledger.sell(&s, 0, OrderSize::Units(2.0)).unwrap();
        assert_eq!(ledger.units_held(), -2.0);
        assert!((ledger.cash() - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn strict_buy_rejects_overdraw() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default()).with_strict(true);
        let err = ledger.buy(&s, 0, OrderSize::Units(11.0)).unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientFunds { .. }));
        assert_eq!(ledger.trade_count(), 0);
        assert!((ledger.cash() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn strict_amount_sizing_is_net_of_costs() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::new(10.0, 0.01)).with_strict(true);
        let ev = ledger.buy(&s, 0, OrderSize::Amount(1000.0)).unwrap();
        // (1000 - 10) / 1.01 / 100 = 9.80 -> 9 units, debit 919
        assert_eq!(ev.units, 9.0);
        assert!((ledger.cash() - 81.0).abs() < 1e-9);
    }

    #[test]
    fn strict_full_cash_entry_never_rounds_into_overdraw() {
        let price = 3.3000000000000003;
        let s = series(&[price, price]);
        let mut ledger =
            Ledger::new(1000.0, CostModel::new(3.4000000000000004, 0.0)).with_strict(true);
        let cash = ledger.cash();
        let ev = ledger.buy(&s, 0, OrderSize::Amount(cash)).unwrap();
        // 996.6 / 3.3 floors to a 302 lot whose debit rounds just past 1000
        assert_eq!(ev.units, 301.0);
        assert!(ledger.cash() >= 0.0);
        assert_eq!(ledger.trade_count(), 1);
    }

    #[test]
    fn strict_sell_rejects_unheld() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default()).with_strict(true);
        let err = ledger.sell(&s, 0, OrderSize::Units(1.0)).unwrap_err();
        assert!(matches!(err, BacktestError::InsufficientUnits { .. }));
        assert_eq!(ledger.trade_count(), 0);
    }

    #[test]
    fn negative_units_rejected() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default());
        assert!(matches!(
            ledger.buy(&s, 0, OrderSize::Units(-1.0)),
            Err(BacktestError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn out_of_range_bar() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default());
        assert!(matches!(
            ledger.buy(&s, 5, OrderSize::Units(1.0)),
            Err(BacktestError::IndexOutOfRange { bar: 5, len: 1 })
        ));
        assert!(matches!(
            ledger.close_out(&s, 1),
            Err(BacktestError::IndexOutOfRange { .. })
        ));
        assert_eq!(ledger.trade_count(), 0);
    }

    #[test]
    fn close_out_is_cost_free() {
        let s = series(&[100.0, 100.0, 120.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::new(10.0, 0.01));
        ledger.buy(&s, 0, OrderSize::Units(5.0)).unwrap();
        let ev = ledger.close_out(&s, 1).unwrap();
        // 485 + 5 * 120
        assert!((ledger.cash() - 1085.0).abs() < 1e-9);
        assert_eq!(ev.units, 5.0);
        assert_eq!(ledger.units_held(), 0.0);
        assert_eq!(ledger.trade_count(), 2);
    }

    #[test]
    fn empty_close_out_still_counts() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default());
        ledger.close_out(&s, 0).unwrap();
        assert_eq!(ledger.trade_count(), 1);
        assert!((ledger.cash() - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn net_wealth_marks_to_market() {
        let s = series(&[100.0, 100.0, 150.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default());
        ledger.buy(&s, 0, OrderSize::Units(4.0)).unwrap();
        assert!((ledger.net_wealth(&s, 1).unwrap() - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn performance_pct_after_close_out() {
        let s = series(&[100.0, 100.0, 150.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::default());
        ledger.buy(&s, 0, OrderSize::Amount(1000.0)).unwrap();
        ledger.close_out(&s, 1).unwrap();
        assert!((ledger.performance_pct() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn reset_restores_initial_state() {
        let s = series(&[100.0, 100.0]);
        let mut ledger = Ledger::new(1000.0, CostModel::new(1.0, 0.0));
        ledger.buy(&s, 0, OrderSize::Units(3.0)).unwrap();
        ledger.reset();
        assert!((ledger.cash() - 1000.0).abs() < f64::EPSILON);
        assert_eq!(ledger.units_held(), 0.0);
        assert_eq!(ledger.trade_count(), 0);
    }
}
