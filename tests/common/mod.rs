#![allow(dead_code)]

use bartrader::domain::error::BacktestError;
use bartrader::domain::ledger::{CloseOutEvent, TradeEvent};
use bartrader::domain::price_series::PriceSeries;
use bartrader::ports::data_port::DataPort;
use bartrader::ports::trade_observer::TradeObserver;
use chrono::NaiveDate;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Series from raw daily observations starting 2024-01-01; the first one
/// only seeds the first return.
pub fn series_from_raw(prices: &[f64]) -> PriceSeries {
    let start = date(2024, 1, 1);
    PriceSeries::from_observations(
        prices
            .iter()
            .enumerate()
            .map(|(i, &p)| (start + chrono::Duration::days(i as i64), p))
            .collect(),
    )
    .unwrap()
}

/// Series whose bars carry exactly `prices`, bar 0 first.
pub fn series_from_bars(prices: &[f64]) -> PriceSeries {
    let mut raw = Vec::with_capacity(prices.len() + 1);
    raw.push(prices[0]);
    raw.extend_from_slice(prices);
    series_from_raw(&raw)
}

pub struct MockDataPort {
    pub series: Option<PriceSeries>,
}

impl MockDataPort {
    pub fn new(series: PriceSeries) -> Self {
        Self {
            series: Some(series),
        }
    }

    pub fn failing() -> Self {
        Self { series: None }
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<PriceSeries, BacktestError> {
        let series = self.series.as_ref().ok_or_else(|| BacktestError::Data {
            reason: "provider unavailable".into(),
        })?;
        let start = start.unwrap_or(NaiveDate::MIN);
        let end = end.unwrap_or(NaiveDate::MAX);
        Ok(series.slice_dates(start, end))
    }
}

#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub trades: Vec<TradeEvent>,
    pub close_outs: Vec<CloseOutEvent>,
}

impl TradeObserver for RecordingObserver {
    fn on_trade(&mut self, event: &TradeEvent) {
        self.trades.push(event.clone());
    }

    fn on_close_out(&mut self, event: &CloseOutEvent) {
        self.close_outs.push(event.clone());
    }
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}
