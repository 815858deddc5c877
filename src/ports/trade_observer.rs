//! Trade event sink port.

use crate::domain::ledger::{CloseOutEvent, TradeEvent};

/// Receives one event per executed buy or sell, and the final liquidation.
pub trait TradeObserver {
    fn on_trade(&mut self, event: &TradeEvent);

    /// Default implementation: ignore the close-out.
    fn on_close_out(&mut self, _event: &CloseOutEvent) {}
}
