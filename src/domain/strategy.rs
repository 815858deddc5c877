//! Signal generation for the three long-only strategies.
//!
//! Each strategy turns a `PriceSeries` into per-bar entry and exit
//! predicates. Indicators are computed once over the whole series and only
//! ever read at or before the bar being evaluated.

use std::fmt;
use std::str::FromStr;

use super::error::BacktestError;
use super::indicator::IndicatorSeries;
use super::indicator::rolling::{calculate_momentum, calculate_sma};
use super::price_series::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    SmaCrossover,
    Momentum,
    MeanReversion,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::SmaCrossover,
        StrategyKind::Momentum,
        StrategyKind::MeanReversion,
    ];
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::SmaCrossover => write!(f, "sma"),
            StrategyKind::Momentum => write!(f, "momentum"),
            StrategyKind::MeanReversion => write!(f, "mean_reversion"),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "sma" | "sma_crossover" => Ok(StrategyKind::SmaCrossover),
            "momentum" | "mom" => Ok(StrategyKind::Momentum),
            "mean_reversion" | "mr" => Ok(StrategyKind::MeanReversion),
            other => Err(format!(
                "unknown strategy '{}' (expected sma, momentum or mean_reversion)",
                other
            )),
        }
    }
}

/// Parameter set shared by all strategy kinds; each kind reads its own fields.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyParams {
    pub sma1: usize,
    pub sma2: usize,
    pub momentum: usize,
    pub sma: usize,
    pub threshold: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            sma1: 5,
            sma2: 20,
            momentum: 20,
            sma: 30,
            threshold: 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Strategy {
    /// Long while SMA1 is above SMA2.
    SmaCrossover { sma1: usize, sma2: usize },
    /// Long while the rolling mean log return is positive.
    Momentum { window: usize },
    /// Enter below SMA - threshold, exit once price is back at the SMA.
    MeanReversion { sma: usize, threshold: f64 },
}

impl Strategy {
    pub fn from_kind(kind: StrategyKind, params: &StrategyParams) -> Self {
        match kind {
            StrategyKind::SmaCrossover => Strategy::SmaCrossover {
                sma1: params.sma1,
                sma2: params.sma2,
            },
            StrategyKind::Momentum => Strategy::Momentum {
                window: params.momentum,
            },
            StrategyKind::MeanReversion => Strategy::MeanReversion {
                sma: params.sma,
                threshold: params.threshold,
            },
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::SmaCrossover { .. } => StrategyKind::SmaCrossover,
            Strategy::Momentum { .. } => StrategyKind::Momentum,
            Strategy::MeanReversion { .. } => StrategyKind::MeanReversion,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::SmaCrossover { .. } => "SMA crossover",
            Strategy::Momentum { .. } => "Momentum",
            Strategy::MeanReversion { .. } => "Mean reversion",
        }
    }

    /// First bar index at which the loop may evaluate signals: the longest
    /// rolling window the strategy needs.
    pub fn warmup(&self) -> usize {
        match *self {
            Strategy::SmaCrossover { sma1, sma2 } => sma1.max(sma2),
            Strategy::Momentum { window } => window,
            Strategy::MeanReversion { sma, .. } => sma,
        }
    }

    pub fn validate(&self) -> Result<(), BacktestError> {
        let invalid = |reason: &str| BacktestError::InvalidParameter {
            strategy: self.to_string(),
            reason: reason.to_string(),
        };
        match *self {
            Strategy::SmaCrossover { sma1, sma2 } => {
                if sma1 == 0 || sma2 == 0 {
                    return Err(invalid("SMA windows must be at least 1"));
                }
            }
            Strategy::Momentum { window } => {
                if window == 0 {
                    return Err(invalid("momentum window must be at least 1"));
                }
            }
            Strategy::MeanReversion { sma, threshold } => {
                if sma == 0 {
                    return Err(invalid("SMA window must be at least 1"));
                }
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(invalid("threshold must be a non-negative number"));
                }
            }
        }
        Ok(())
    }

    /// Fails fast when the series cannot fill the warm-up window.
    pub fn check_warmup(&self, series: &PriceSeries) -> Result<(), BacktestError> {
        let warmup = self.warmup();
        if warmup >= series.len() {
            return Err(BacktestError::InsufficientWarmup {
                strategy: self.to_string(),
                warmup,
                bars: series.len(),
            });
        }
        Ok(())
    }

    pub fn signals(&self, series: &PriceSeries) -> Result<Signals, BacktestError> {
        self.validate()?;
        self.check_warmup(series)?;

        let signals = match *self {
            Strategy::SmaCrossover { sma1, sma2 } => Signals::SmaCrossover {
                sma1: calculate_sma(series, sma1),
                sma2: calculate_sma(series, sma2),
            },
            Strategy::Momentum { window } => Signals::Momentum {
                momentum: calculate_momentum(series, window),
            },
            Strategy::MeanReversion { sma, threshold } => Signals::MeanReversion {
                prices: series.prices(),
                sma: calculate_sma(series, sma),
                threshold,
            },
        };
        Ok(signals)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::SmaCrossover { sma1, sma2 } => write!(f, "SMA({},{})", sma1, sma2),
            Strategy::Momentum { window } => write!(f, "MOMENTUM({})", window),
            Strategy::MeanReversion { sma, threshold } => {
                write!(f, "MEAN_REVERSION({},{})", sma, threshold)
            }
        }
    }
}

/// Precomputed indicator columns for one strategy run.
///
/// Both predicates are false wherever a required indicator is still in its
/// warm-up, so they can never act on undefined values.
#[derive(Debug, Clone)]
pub enum Signals {
    SmaCrossover {
        sma1: IndicatorSeries,
        sma2: IndicatorSeries,
    },
    Momentum {
        momentum: IndicatorSeries,
    },
    MeanReversion {
        prices: Vec<f64>,
        sma: IndicatorSeries,
        threshold: f64,
    },
}

impl Signals {
    /// Entry condition, evaluated while flat.
    pub fn enter(&self, bar: usize) -> bool {
        match self {
            Signals::SmaCrossover { sma1, sma2 } => {
                matches!((sma1.value_at(bar), sma2.value_at(bar)), (Some(a), Some(b)) if a > b)
            }
            Signals::Momentum { momentum } => momentum.value_at(bar).is_some_and(|m| m > 0.0),
            Signals::MeanReversion {
                prices,
                sma,
                threshold,
            } => match (prices.get(bar), sma.value_at(bar)) {
                (Some(&price), Some(mean)) => price < mean - threshold,
                _ => false,
            },
        }
    }

    /// Exit condition, evaluated while long. Equality holds the position for
    /// the crossover and momentum strategies; mean reversion exits at the SMA
    /// itself.
    pub fn exit(&self, bar: usize) -> bool {
        match self {
            Signals::SmaCrossover { sma1, sma2 } => {
                matches!((sma1.value_at(bar), sma2.value_at(bar)), (Some(a), Some(b)) if a < b)
            }
            Signals::Momentum { momentum } => momentum.value_at(bar).is_some_and(|m| m < 0.0),
            Signals::MeanReversion { prices, sma, .. } => match (prices.get(bar), sma.value_at(bar)) {
                (Some(&price), Some(mean)) => price >= mean,
                _ => false,
            },
        }
    }
}
