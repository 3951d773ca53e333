//! Remote market-snapshot API
//!
//! Issues a single request for the current top-N window. The endpoint has no
//! incremental cursor, so the watermark is accepted and ignored (full-refresh
//! mode); every call returns the whole window again.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use super::SourceAdapter;
use crate::ingest::config::{ApiSourceConfig, SourceKind};
use crate::ingest::error::EtlResult;

pub struct ApiSource {
    client: Client,
    config: ApiSourceConfig,
}

impl ApiSource {
    pub fn new(config: ApiSourceConfig) -> EtlResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("unisync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    fn query(&self) -> [(&'static str, String); 6] {
        [
            ("vs_currency", self.config.vs_currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", self.config.per_page.to_string()),
            ("page", "1".to_string()),
            ("sparkline", "false".to_string()),
            ("locale", "en".to_string()),
        ]
    }
}

#[async_trait]
impl SourceAdapter for ApiSource {
    async fn fetch(&self, last_external_id: Option<i64>) -> EtlResult<Vec<Value>> {
        if let Some(watermark) = last_external_id {
            debug!(watermark, "Remote source ignores watermark, fetching full snapshot");
        }

        let mut request = self.client.get(&self.config.url).query(&self.query());
        if let Some(key) = self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            request = request.header("X-API-Key", key);
        }

        let items: Vec<Value> = request.send().await?.error_for_status()?.json().await?;

        info!(url = %self.config.url, records = items.len(), "Fetched remote snapshot");
        Ok(items)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Api
    }
}
