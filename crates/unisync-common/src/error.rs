//! Error types shared across unisync crates

use thiserror::Error;

/// Result type alias for unisync operations
pub type Result<T> = std::result::Result<T, UnisyncError>;

/// Main error type for unisync
#[derive(Error, Debug)]
pub enum UnisyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}
