//! Simple rolling mean.
//!
//! MEAN(n)[i] = sum(X[i-j] for j in 0..n) / n
//! Warmup: first (n-1) bars are invalid. A zero window yields no points.

use chrono::NaiveDate;

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};
use crate::domain::price_series::PriceSeries;

pub fn rolling_mean(
    dates: &[NaiveDate],
    values: &[f64],
    indicator_type: IndicatorType,
    window: usize,
) -> IndicatorSeries {
    if window == 0 {
        return IndicatorSeries {
            indicator_type,
            values: vec![],
        };
    }

    let mut points = Vec::with_capacity(values.len());

    for (i, &date) in dates.iter().enumerate().take(values.len()) {
        let valid = i + 1 >= window;
        let value = if valid {
            values[i + 1 - window..=i].iter().sum::<f64>() / window as f64
        } else {
            0.0
        };
        points.push(IndicatorPoint { date, valid, value });
    }

    IndicatorSeries {
        indicator_type,
        values: points,
    }
}

/// Rolling mean of price over `period` bars.
pub fn calculate_sma(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let dates: Vec<NaiveDate> = series.bars().iter().map(|b| b.date).collect();
    rolling_mean(&dates, &series.prices(), IndicatorType::Sma(period), period)
}

/// Rolling mean of log return over `period` bars.
pub fn calculate_momentum(series: &PriceSeries, period: usize) -> IndicatorSeries {
    let dates: Vec<NaiveDate> = series.bars().iter().map(|b| b.date).collect();
    rolling_mean(
        &dates,
        &series.returns(),
        IndicatorType::Momentum(period),
        period,
    )
}
