//! Source adapters
//!
//! One adapter per [`SourceKind`]. Adapters are pure reads: they never touch
//! the store and never advance a checkpoint.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::config::{EtlConfig, SourceConfig, SourceKind};
use super::error::{EtlError, EtlResult};

pub mod api;
pub mod csv_file;

pub use api::ApiSource;
pub use csv_file::CsvFileSource;

/// Fetch capability shared by every source
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Return the payloads newer than `last_external_id`
    ///
    /// Adapters that cannot filter by watermark return their full snapshot.
    async fn fetch(&self, last_external_id: Option<i64>) -> EtlResult<Vec<Value>>;

    fn kind(&self) -> SourceKind;
}

/// Build the adapter for a configured source
pub fn build_adapter(
    source: &SourceConfig,
    config: &EtlConfig,
) -> EtlResult<Arc<dyn SourceAdapter>> {
    match source.kind {
        SourceKind::Api => Ok(Arc::new(ApiSource::new(config.api.clone())?)),
        kind @ (SourceKind::Csv1 | SourceKind::Csv2) => {
            let path = config.path_for(kind).ok_or_else(|| {
                EtlError::Config(format!("no file path configured for source '{}'", source.name))
            })?;
            Ok(Arc::new(CsvFileSource::new(kind, path)))
        },
    }
}

/// Parse a source-native identifier as used for watermarks
pub fn parse_native_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_native_id() {
        assert_eq!(parse_native_id("12"), Some(12));
        assert_eq!(parse_native_id(" 7 "), Some(7));
        assert_eq!(parse_native_id("12.5"), None);
        assert_eq!(parse_native_id(""), None);
    }

    #[test]
    fn test_build_adapter_per_kind() {
        let config = EtlConfig::default();
        for source in &config.sources {
            let adapter = build_adapter(source, &config).unwrap();
            assert_eq!(adapter.kind(), source.kind);
        }
    }
}
