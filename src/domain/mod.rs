//! Core domain types and logic.

pub mod price_series;
pub mod indicator;
pub mod ledger;
pub mod strategy;
pub mod backtest;
pub mod report;
pub mod vectorized;
pub mod config_validation;
pub mod error;
