//! Health route

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db;

pub fn health_routes() -> Router<PgPool> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LastRun {
    pub last_status: String,
    pub last_source: String,
    pub last_finished_at: Option<DateTime<Utc>>,
    pub last_records_processed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `OK` or `DEGRADED`
    pub status: String,
    /// `UP` or `DOWN`
    pub database: String,
    pub etl_last_run: Option<LastRun>,
}

impl HealthResponse {
    fn up(etl_last_run: Option<LastRun>) -> Self {
        Self {
            status: "OK".to_string(),
            database: "UP".to_string(),
            etl_last_run,
        }
    }

    fn down() -> Self {
        Self {
            status: "DEGRADED".to_string(),
            database: "DOWN".to_string(),
            etl_last_run: None,
        }
    }
}

async fn last_finished_run(pool: &PgPool) -> Result<Option<LastRun>, sqlx::Error> {
    sqlx::query_as::<_, LastRun>(
        r#"
        SELECT
            status AS last_status,
            source AS last_source,
            finished_at AS last_finished_at,
            records_processed AS last_records_processed
        FROM etl_runs
        WHERE finished_at IS NOT NULL
        ORDER BY finished_at DESC, id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

/// Liveness plus last run
///
/// GET /health
///
/// Always answers 200; an unreachable database is reported in the body.
async fn health(State(db): State<PgPool>) -> Json<HealthResponse> {
    if let Err(e) = db::health_check(&db).await {
        tracing::warn!(error = %e, "Database health check failed");
        return Json(HealthResponse::down());
    }

    match last_finished_run(&db).await {
        Ok(last) => Json(HealthResponse::up(last)),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read last run");
            Json(HealthResponse::down())
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::features::shared::test_helpers::{unreachable_pool, TestRun};

    async fn get_health(pool: PgPool) -> (StatusCode, Value) {
        let response = health_routes()
            .with_state(pool)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_degraded_without_database() {
        let (status, body) = get_health(unreachable_pool()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "DEGRADED");
        assert_eq!(body["database"], "DOWN");
        assert!(body["etl_last_run"].is_null());
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_health_reports_last_finished_run(pool: PgPool) -> sqlx::Result<()> {
        TestRun::success("csv1", 5).insert(&pool).await?;
        TestRun::running("api").insert(&pool).await?;

        let (status, body) = get_health(pool).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["database"], "UP");
        assert_eq!(body["etl_last_run"]["last_source"], "csv1");
        assert_eq!(body["etl_last_run"]["last_status"], "SUCCESS");
        assert_eq!(body["etl_last_run"]["last_records_processed"], 5);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore] // Requires database
    async fn test_health_without_runs(pool: PgPool) -> sqlx::Result<()> {
        let (_, body) = get_health(pool).await;

        assert_eq!(body["status"], "OK");
        assert!(body["etl_last_run"].is_null());
        Ok(())
    }
}
