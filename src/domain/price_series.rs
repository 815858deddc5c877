//! Time-indexed price series with log returns.
//!
//! A `PriceSeries` is built once from raw (date, price) observations and is
//! read-only afterwards. The first raw observation has no return and is
//! dropped, so bar 0 is the second observation.

use chrono::NaiveDate;

use super::error::BacktestError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub price: f64,
    /// ln(price[t] / price[t-1])
    pub log_return: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series from raw observations in ascending date order.
    pub fn from_observations(observations: Vec<(NaiveDate, f64)>) -> Result<Self, BacktestError> {
        if observations.len() < 2 {
            return Err(BacktestError::InvalidSeries {
                reason: format!(
                    "need at least 2 observations to compute returns, got {}",
                    observations.len()
                ),
            });
        }

        for (date, price) in &observations {
            if !price.is_finite() || *price <= 0.0 {
                return Err(BacktestError::InvalidSeries {
                    reason: format!("non-positive price {} on {}", price, date),
                });
            }
        }

        for pair in observations.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(BacktestError::InvalidSeries {
                    reason: format!(
                        "dates must be strictly increasing: {} follows {}",
                        pair[1].0, pair[0].0
                    ),
                });
            }
        }

        let bars = observations
            .windows(2)
            .map(|pair| PriceBar {
                date: pair[1].0,
                price: pair[1].1,
                log_return: (pair[1].1 / pair[0].1).ln(),
            })
            .collect();

        Ok(Self { bars })
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn get(&self, bar: usize) -> Result<&PriceBar, BacktestError> {
        self.bars.get(bar).ok_or(BacktestError::IndexOutOfRange {
            bar,
            len: self.bars.len(),
        })
    }

    pub fn date_price(&self, bar: usize) -> Result<(NaiveDate, f64), BacktestError> {
        self.get(bar).map(|b| (b.date, b.price))
    }

    pub fn prices(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.price).collect()
    }

    pub fn returns(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.log_return).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Restrict to bars dated within `[start, end]`. Returns are kept as
    /// computed against the full history, so the first kept bar still carries
    /// its return from the observation before `start`.
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let bars = self
            .bars
            .iter()
            .filter(|b| b.date >= start && b.date <= end)
            .cloned()
            .collect();
        Self { bars }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn sample_series() -> PriceSeries {
        PriceSeries::from_observations(vec![
            (day(1), 100.0),
            (day(2), 102.0),
            (day(3), 101.0),
            (day(4), 105.0),
        ])
        .unwrap()
    }

    #[test]
    fn first_observation_dropped() {
        let series = sample_series();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_date(), Some(day(2)));
        assert_eq!(series.last_date(), Some(day(4)));
    }

    #[test]
    fn log_returns_computed() {
        let series = sample_series();
        let returns = series.returns();
        assert!((returns[0] - (102.0_f64 / 100.0).ln()).abs() < 1e-12);
        assert!((returns[1] - (101.0_f64 / 102.0).ln()).abs() < 1e-12);
        assert!((returns[2] - (105.0_f64 / 101.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn date_price_lookup() {
        let series = sample_series();
        let (date, price) = series.date_price(1).unwrap();
        assert_eq!(date, day(3));
        assert!((price - 101.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_lookup() {
        let series = sample_series();
        let err = series.date_price(3).unwrap_err();
        assert!(matches!(err, BacktestError::IndexOutOfRange { bar: 3, len: 3 }));
    }

    #[test]
    fn rejects_single_observation() {
        let err = PriceSeries::from_observations(vec![(day(1), 100.0)]).unwrap_err();
        assert!(matches!(err, BacktestError::InvalidSeries { .. }));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = PriceSeries::from_observations(vec![(day(1), 100.0), (day(1), 101.0)])
            .unwrap_err();
        assert!(matches!(err, BacktestError::InvalidSeries { .. }));
    }

    #[test]
    fn rejects_unsorted_dates() {
        let err = PriceSeries::from_observations(vec![
            (day(2), 100.0),
            (day(1), 101.0),
            (day(3), 102.0),
        ])
        .unwrap_err();
        assert!(matches!(err, BacktestError::InvalidSeries { .. }));
    }

    #[test]
    fn rejects_non_positive_price() {
        let err = PriceSeries::from_observations(vec![(day(1), 100.0), (day(2), 0.0)])
            .unwrap_err();
        assert!(matches!(err, BacktestError::InvalidSeries { .. }));
    }

    #[test]
    fn slice_keeps_closed_range() {
        let series = sample_series();
        let sliced = series.slice_dates(day(3), day(4));
        assert_eq!(sliced.len(), 2);
        assert_eq!(sliced.first_date(), Some(day(3)));
        assert!((sliced.bars()[0].log_return - (101.0_f64 / 102.0).ln()).abs() < 1e-12);
    }
}
