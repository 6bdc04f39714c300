//! Error types for fx-stress

use thiserror::Error;

/// Main error type for fx-stress
#[derive(Error, Debug)]
pub enum FxStressError {
    #[error("Currency not found in rate table: {0}")]
    MissingCurrency(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Download failed for {dataset}: {reason}")]
    DownloadError { dataset: String, reason: String },

    #[error("Registry error: {0}")]
    RegistryError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for fx-stress operations
pub type Result<T> = std::result::Result<T, FxStressError>;
