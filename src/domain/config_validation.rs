//! Configuration validation.
//!
//! Validates all config fields before any data is loaded.

use crate::domain::error::BacktestError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_initial_amount(config)?;
    validate_costs(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    validate_kind(config)?;
    for key in ["sma1", "sma2", "momentum", "sma"] {
        validate_window(config, key)?;
    }
    validate_threshold(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> BacktestError {
    BacktestError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_initial_amount(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_double("backtest", "initial_amount", 10_000.0);
    if !(value > 0.0 && value.is_finite()) {
        return Err(invalid(
            "backtest",
            "initial_amount",
            "initial_amount must be positive",
        ));
    }
    Ok(())
}

fn validate_costs(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let fixed = config.get_double("backtest", "fixed_cost", 0.0);
    if fixed < 0.0 {
        return Err(invalid(
            "backtest",
            "fixed_cost",
            "fixed_cost must be non-negative",
        ));
    }
    let proportional = config.get_double("backtest", "proportional_cost", 0.0);
    if !(0.0..1.0).contains(&proportional) {
        return Err(invalid(
            "backtest",
            "proportional_cost",
            "proportional_cost must be in [0, 1)",
        ));
    }
    Ok(())
}

/// Dates are optional; when both are given the range must be non-empty.
fn validate_dates(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, BacktestError> {
    match config.get_string("data", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| BacktestError::ConfigInvalid {
                section: "data".to_string(),
                key: key.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", key),
            }),
    }
}

fn validate_kind(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    match config.get_string("strategy", "kind") {
        None => Ok(()),
        Some(s) => s
            .parse::<StrategyKind>()
            .map(|_| ())
            .map_err(|reason| invalid("strategy", "kind", &reason)),
    }
}

fn validate_window(config: &dyn ConfigPort, key: &str) -> Result<(), BacktestError> {
    let value = config.get_int("strategy", key, 1);
    if value < 1 {
        return Err(invalid(
            "strategy",
            key,
            &format!("{} must be at least 1", key),
        ));
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), BacktestError> {
    let value = config.get_double("strategy", "threshold", 0.0);
    if value < 0.0 {
        return Err(invalid(
            "strategy",
            "threshold",
            "threshold must be non-negative",
        ));
    }
    Ok(())
}
