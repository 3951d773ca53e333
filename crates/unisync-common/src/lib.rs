//! Unisync Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared utilities and error handling for the unisync workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`UnisyncError`] and the [`Result`] alias
//! - **Logging**: tracing subscriber bootstrap shared by every binary
//! - **Hashing**: stable hashes for derived identifiers
//! - **Time**: lenient ISO-8601 parsing used by record transformers
//!
//! # Example
//!
//! ```no_run
//! use unisync_common::logging::{init_logging, LogConfig};
//! use unisync_common::time::parse_iso8601;
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!     let ts = parse_iso8601("2024-01-01T00:00:00Z")?;
//!     tracing::info!(%ts, "parsed");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod hashing;
pub mod logging;
pub mod time;

// Re-export commonly used types
pub use error::{Result, UnisyncError};
