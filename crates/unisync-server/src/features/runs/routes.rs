//! Run history routes

use axum::{extract::State, routing::get, Json, Router};
use sqlx::PgPool;

use super::queries::{latest, stats, LatestRunsResponse, StatsResponse};
use crate::error::AppResult;

pub fn runs_routes() -> Router<PgPool> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/runs/latest", get(latest_runs))
}

/// Aggregated run counters per source
///
/// GET /stats
async fn get_stats(State(db): State<PgPool>) -> AppResult<Json<StatsResponse>> {
    Ok(Json(stats::handle(db).await?))
}

/// Most recent run row of each source
///
/// GET /runs/latest
async fn latest_runs(State(db): State<PgPool>) -> AppResult<Json<LatestRunsResponse>> {
    Ok(Json(latest::handle(db).await?))
}
