//! Domain error types.

/// Top-level error type for votetrader.
#[derive(Debug, thiserror::Error)]
pub enum VoteTraderError {
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

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid price series: {reason}")]
    InvalidSeries { reason: String },

    #[error("no data to simulate for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VoteTraderError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        VoteTraderError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&VoteTraderError> for std::process::ExitCode {
    fn from(err: &VoteTraderError) -> Self {
        let code: u8 = match err {
            VoteTraderError::Io(_) => 1,
            VoteTraderError::ConfigParse { .. }
            | VoteTraderError::ConfigMissing { .. }
            | VoteTraderError::ConfigInvalid { .. } => 2,
            VoteTraderError::Data { .. } => 3,
            VoteTraderError::InvalidParameter { .. } | VoteTraderError::InvalidSeries { .. } => 4,
            VoteTraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
