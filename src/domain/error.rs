//! Domain error types.

/// Top-level error type for bartrader.
///
/// Every error is terminal for the simulation run that raised it: a run either
/// completes fully or aborts, since each bar depends on the state left by the
/// previous one.
#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("bar index {bar} out of range for series of {len} bars")]
    IndexOutOfRange { bar: usize, len: usize },

    #[error("insufficient warm-up for {strategy}: needs {warmup} bars of history, series has {bars}")]
    InsufficientWarmup {
        strategy: String,
        warmup: usize,
        bars: usize,
    },

    #[error("invalid parameter for {strategy}: {reason}")]
    InvalidParameter { strategy: String, reason: String },

    #[error("insufficient funds: order needs {required:.2}, cash is {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("insufficient units: sell of {requested} requested, {held} held")]
    InsufficientUnits { requested: f64, held: f64 },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BacktestError {
    /// Process exit status for this error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            BacktestError::Io(_) => 1,
            BacktestError::ConfigParse { .. }
            | BacktestError::ConfigMissing { .. }
            | BacktestError::ConfigInvalid { .. } => 2,
            BacktestError::Data { .. } | BacktestError::InvalidSeries { .. } => 3,
            BacktestError::InsufficientWarmup { .. } | BacktestError::InvalidParameter { .. } => 4,
            BacktestError::InvalidOrder { .. }
            | BacktestError::IndexOutOfRange { .. }
            | BacktestError::InsufficientFunds { .. }
            | BacktestError::InsufficientUnits { .. } => 5,
        }
    }
}

impl From<&BacktestError> for std::process::ExitCode {
    fn from(err: &BacktestError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warmup_error_message() {
        let err = BacktestError::InsufficientWarmup {
            strategy: "SMA(5,20)".into(),
            warmup: 20,
            bars: 12,
        };
        assert_eq!(
            err.to_string(),
            "insufficient warm-up for SMA(5,20): needs 20 bars of history, series has 12"
        );
    }

    #[test]
    fn index_error_message() {
        let err = BacktestError::IndexOutOfRange { bar: 7, len: 5 };
        assert_eq!(
            err.to_string(),
            "bar index 7 out of range for series of 5 bars"
        );
    }

    #[test]
    fn config_errors_share_exit_code() {
        let missing = BacktestError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        };
        let invalid = BacktestError::ConfigInvalid {
            section: "backtest".into(),
            key: "fixed_cost".into(),
            reason: "must be non-negative".into(),
        };
        assert_eq!(missing.exit_status(), 2);
        assert_eq!(invalid.exit_status(), 2);
    }

    #[test]
    fn ledger_errors_exit_five() {
        let err = BacktestError::InsufficientFunds {
            required: 110.0,
            available: 100.0,
        };
        assert_eq!(err.exit_status(), 5);
        assert_eq!(
            BacktestError::IndexOutOfRange { bar: 3, len: 2 }.exit_status(),
            5
        );
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: BacktestError = io.into();
        assert!(matches!(err, BacktestError::Io(_)));
    }
}
