//! Price data access port trait.

use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;

/// Supplies a fully loaded, cleaned series before the simulation starts.
pub trait DataPort {
    /// Bars dated within `[start, end]`; open bounds take everything available.
    fn fetch_prices(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, BacktestError>;
}
