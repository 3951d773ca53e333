//! Per-source run statistics

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SourceStats {
    pub source: String,
    pub total_runs: i64,
    /// Sum of `records_processed` over all runs
    pub total_processed: i64,
    pub last_success: Option<DateTime<Utc>>,
    pub last_failure: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: Vec<SourceStats>,
}

pub async fn handle(pool: PgPool) -> Result<StatsResponse, sqlx::Error> {
    let stats = sqlx::query_as::<_, SourceStats>(
        r#"
        SELECT
            source,
            COUNT(*) AS total_runs,
            COALESCE(SUM(records_processed), 0)::BIGINT AS total_processed,
            MAX(finished_at) FILTER (WHERE status = 'SUCCESS') AS last_success,
            MAX(finished_at) FILTER (WHERE status = 'FAILURE') AS last_failure
        FROM etl_runs
        GROUP BY source
        ORDER BY source
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(StatsResponse { stats })
}
