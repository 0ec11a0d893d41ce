//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for sectrader.
#[derive(Debug, thiserror::Error)]
pub enum SectraderError {
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

    #[error("insufficient funds to buy {quantity} shares of {security} at {price}: available cash {cash}")]
    InsufficientFunds {
        security: String,
        quantity: u64,
        price: f64,
        cash: f64,
    },

    #[error("cannot sell {requested} shares of {security}: only {held} held")]
    OverSell {
        security: String,
        requested: u64,
        held: u64,
    },

    #[error("invalid trade in {security}: {reason}")]
    InvalidTrade { security: String, reason: String },

    #[error("invalid data shape: {reason}")]
    DataShape { reason: String },

    #[error("dates must be strictly increasing: {previous} followed by {next}")]
    UnorderedDates { previous: NaiveDate, next: NaiveDate },

    #[error("data source error: {reason}")]
    Data { reason: String },

    #[error("{code} is not in the data store")]
    NotInStore { code: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SectraderError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SectraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn shape(reason: impl Into<String>) -> Self {
        SectraderError::DataShape {
            reason: reason.into(),
        }
    }
}

impl SectraderError {
    /// Process exit status for the error family.
    pub fn exit_status(&self) -> u8 {
        match self {
            SectraderError::Io(_) => 1,
            SectraderError::ConfigParse { .. }
            | SectraderError::ConfigMissing { .. }
            | SectraderError::ConfigInvalid { .. } => 2,
            SectraderError::Data { .. } | SectraderError::NotInStore { .. } => 3,
            SectraderError::InsufficientFunds { .. }
            | SectraderError::OverSell { .. }
            | SectraderError::InvalidTrade { .. } => 4,
            SectraderError::DataShape { .. }
            | SectraderError::UnorderedDates { .. }
            | SectraderError::NoData { .. } => 5,
        }
    }
}

impl From<&SectraderError> for std::process::ExitCode {
    fn from(err: &SectraderError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}
