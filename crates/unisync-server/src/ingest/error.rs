//! Pipeline error taxonomy
//!
//! Transient source errors, store errors and configuration errors all surface
//! as [`EtlError`] and end the current attempt. Malformed input is reported per
//! record as [`SkipReason`]; whether it aborts the attempt is decided by the
//! source's [`MalformedPolicy`](super::config::MalformedPolicy).

use thiserror::Error;

/// Result type alias for pipeline operations
pub type EtlResult<T> = std::result::Result<T, EtlError>;

#[derive(Error, Debug)]
pub enum EtlError {
    /// Network failure, timeout or non-2xx response from the remote API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("Malformed record from source '{source_name}': {reason}")]
    Malformed {
        source_name: String,
        reason: SkipReason,
    },

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Unknown source: {0}")]
    UnknownSource(String),

    #[error("Invalid source configuration: {0}")]
    Config(String),

    /// Another attempt currently holds the lease for this source
    #[error("Source '{0}' is already being synchronized by another run")]
    SourceBusy(String),

    #[error("Invalid run transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },

    #[error("{} source(s) failed: {}", .failures.len(), summarize(.failures))]
    BatchFailed { failures: Vec<(String, String)> },
}

fn summarize(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(source, message)| format!("{source}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

impl EtlError {
    /// True for failures the next scheduled invocation may succeed on
    pub fn is_transient(&self) -> bool {
        match self {
            EtlError::Http(_) | EtlError::SourceBusy(_) => true,
            EtlError::Store(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            _ => false,
        }
    }
}

/// Why a single raw record could not be mapped to a unified draft
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("invalid value for `{field}`: {value:?}")]
    InvalidField { field: &'static str, value: String },

    #[error("payload is not an object")]
    NotAnObject,
}
