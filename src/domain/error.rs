//! Domain error types.

/// Why the risk manager refused to admit a trade.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectReason {
    #[error("insufficient balance ({balance:.2})")]
    InsufficientBalance { balance: f64 },

    #[error("position notional {notional:.2} exceeds available balance {balance:.2}")]
    OversizedPosition { notional: f64, balance: f64 },

    #[error("maximum drawdown reached ({drawdown_pct:.2}% >= {max_drawdown_pct:.2}%)")]
    DrawdownLimitReached {
        drawdown_pct: f64,
        max_drawdown_pct: f64,
    },

    #[error("invalid position quantity {quantity}")]
    InvalidQuantity { quantity: f64 },
}

/// Top-level error type for rsitrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("indicator not ready: have {have} closes, need {need}")]
    NotReady { have: usize, need: usize },

    #[error("trade rejected: {reason}")]
    TradeRejected { reason: RejectReason },

    #[error("execution failed: {reason}")]
    ExecutionFailed { reason: String },

    #[error("invariant violation: {reason}")]
    InvariantViolation { reason: String },

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

    #[error("market data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TraderError {
    pub fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<RejectReason> for TraderError {
    fn from(reason: RejectReason) -> Self {
        TraderError::TradeRejected { reason }
    }
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Data { .. } | TraderError::Csv(_) => 3,
            TraderError::Report { .. } => 4,
            TraderError::NotReady { .. }
            | TraderError::TradeRejected { .. }
            | TraderError::ExecutionFailed { .. }
            | TraderError::InvariantViolation { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
