//! Trade observer that writes each fill as a structured `tracing` event.

use crate::domain::ledger::{CloseOutEvent, TradeEvent};
use crate::ports::trade_observer::TradeObserver;

#[derive(Debug, Default)]
pub struct TracingTradeLog {
    trades: usize,
}

impl TracingTradeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buys and sells logged so far.
    pub fn trades(&self) -> usize {
        self.trades
    }
}

impl TradeObserver for TracingTradeLog {
    fn on_trade(&mut self, event: &TradeEvent) {
        self.trades += 1;
        tracing::info!(
            date = %event.date,
            side = %event.side,
            units = event.units,
            price = event.price,
            cash = event.resulting_cash,
            net_wealth = event.resulting_net_wealth,
            "trade"
        );
    }

    fn on_close_out(&mut self, event: &CloseOutEvent) {
        tracing::info!(
            date = %event.date,
            units = event.units,
            price = event.price,
            cash = event.resulting_cash,
            "close out"
        );
    }
}
