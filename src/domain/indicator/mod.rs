//! Rolling indicator series over a `PriceSeries`.
//!
//! - `IndicatorPoint`: a single point, with a `valid` flag for the warm-up
//! - `IndicatorType`: indicator identity + window
//! - `IndicatorSeries`: one point per bar

pub mod rolling;

use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    /// Rolling mean of price.
    Sma(usize),
    /// Rolling mean of log return.
    Momentum(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Value at `bar`, or `None` while the window is still filling.
    pub fn value_at(&self, bar: usize) -> Option<f64> {
        self.values
            .get(bar)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Momentum(period) => write!(f, "MOMENTUM({})", period),
        }
    }
}
