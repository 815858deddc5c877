//! CSV file data adapter.
//!
//! Expects a header row. Dates come from the `date` (or `timestamp`) column,
//! falling back to the first column; prices come from the configured column.

use crate::domain::error::BacktestError;
use crate::domain::price_series::PriceSeries;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    path: PathBuf,
    price_column: String,
}

impl CsvAdapter {
    pub fn new(path: PathBuf, price_column: impl Into<String>) -> Self {
        Self {
            path,
            price_column: price_column.into(),
        }
    }

    fn read_observations(&self) -> Result<Vec<(NaiveDate, f64)>, BacktestError> {
        let content = fs::read_to_string(&self.path).map_err(|e| BacktestError::Data {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| BacktestError::Data {
                reason: format!("CSV header error: {}", e),
            })?
            .clone();

        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let date_idx = find("date").or_else(|| find("timestamp")).unwrap_or(0);
        let price_idx = find(&self.price_column).ok_or_else(|| BacktestError::Data {
            reason: format!(
                "price column '{}' not found in {}",
                self.price_column,
                self.path.display()
            ),
        })?;

        let mut observations = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| BacktestError::Data {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_idx).ok_or_else(|| BacktestError::Data {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                BacktestError::Data {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            let price: f64 = record
                .get(price_idx)
                .ok_or_else(|| BacktestError::Data {
                    reason: format!("missing {} column", self.price_column),
                })?
                .trim()
                .parse()
                .map_err(|e| BacktestError::Data {
                    reason: format!("invalid {} value on {}: {}", self.price_column, date, e),
                })?;

            observations.push((date, price));
        }

        observations.sort_by_key(|(date, _)| *date);
        Ok(observations)
    }
}

impl DataPort for CsvAdapter {
    /// The date range is applied to raw prices before returns are computed,
    /// so the first bar in range is dropped for its missing return.
    fn fetch_prices(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, BacktestError> {
        let observations: Vec<(NaiveDate, f64)> = self
            .read_observations()?
            .into_iter()
            .filter(|(date, _)| start.is_none_or(|s| *date >= s))
            .filter(|(date, _)| end.is_none_or(|e| *date <= e))
            .collect();

        tracing::debug!(
            path = %self.path.display(),
            rows = observations.len(),
            "loaded price observations"
        );
        PriceSeries::from_observations(observations)
    }
}
