//! List unified records query

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::features::shared::{PaginationMetadata, PaginationParams, RequestMeta, RequestTimer};
use crate::ingest::UnifiedRecord;

/// Query string of `GET /data`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListRecordsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    /// Source tag filter, matched case-insensitively
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl ListRecordsQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams::new(self.page, self.page_size)
    }

    /// Lower-cased filter; blank filters are ignored
    pub fn source_filter(&self) -> Option<String> {
        self.source
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn validate(&self) -> Result<(), ListRecordsError> {
        self.pagination()
            .validate()
            .map_err(|reason| ListRecordsError::Validation(reason.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListRecordsResponse {
    pub data: Vec<UnifiedRecord>,
    pub pagination: PaginationMetadata,
    pub meta: RequestMeta,
}

#[derive(Debug, thiserror::Error)]
pub enum ListRecordsError {
    #[error("{0}")]
    Validation(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub async fn handle(
    pool: PgPool,
    query: ListRecordsQuery,
    timer: RequestTimer,
) -> Result<ListRecordsResponse, ListRecordsError> {
    query.validate()?;

    let params = query.pagination();
    let source = query.source_filter();

    let data = sqlx::query_as::<_, UnifiedRecord>(
        r#"
        SELECT id, source, external_id, name, value, timestamp
        FROM unified_records
        WHERE ($1::text IS NULL OR source = $1)
        ORDER BY id
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(source.as_deref())
    .bind(params.page_size())
    .bind(params.offset())
    .fetch_all(&pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM unified_records WHERE ($1::text IS NULL OR source = $1)",
    )
    .bind(source.as_deref())
    .fetch_one(&pool)
    .await?;

    Ok(ListRecordsResponse {
        data,
        pagination: PaginationMetadata::from_params(&params, total),
        meta: timer.finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_filter_is_lower_cased() {
        let query = ListRecordsQuery {
            source: Some(" CSV1 ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.source_filter().as_deref(), Some("csv1"));
    }

    #[test]
    fn test_blank_source_filter_ignored() {
        let query = ListRecordsQuery {
            source: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(query.source_filter().is_none());
    }

    #[test]
    fn test_validation() {
        let ok = ListRecordsQuery {
            page: Some(2),
            page_size: Some(100),
            source: None,
        };
        assert!(ok.validate().is_ok());

        let bad = ListRecordsQuery {
            page_size: Some(500),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(ListRecordsError::Validation(_))));
    }
}
