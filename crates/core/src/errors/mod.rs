//! Error types and Result alias for Wallnance Tycoon

use thiserror::Error;

/// Main error type for the game
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: f64, available: f64 },

    #[error("Insufficient quantity of {symbol}: required {required}, available {available}")]
    InsufficientQuantity {
        symbol: String,
        required: f64,
        available: f64,
    },

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Unknown lesson: {0}")]
    UnknownLesson(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl Error {
    /// True for failures of the backing key-value store
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::StorageError(_))
    }
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidData(err.to_string())
    }
}
