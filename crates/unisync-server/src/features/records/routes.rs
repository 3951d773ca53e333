//! Record routes

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use sqlx::PgPool;

use super::queries::{list, ListRecordsError, ListRecordsQuery, ListRecordsResponse};
use crate::error::{AppError, AppResult};
use crate::features::shared::RequestTimer;

pub fn records_routes() -> Router<PgPool> {
    Router::new().route("/data", get(list_records))
}

/// List unified records
///
/// GET /data?page=1&page_size=10&source=csv1
async fn list_records(
    State(db): State<PgPool>,
    Query(query): Query<ListRecordsQuery>,
) -> AppResult<Json<ListRecordsResponse>> {
    let timer = RequestTimer::start();

    match list::handle(db, query, timer).await {
        Ok(response) => Ok(Json(response)),
        Err(ListRecordsError::Validation(message)) => Err(AppError::Validation(message)),
        Err(ListRecordsError::Database(e)) => Err(AppError::Database(e)),
    }
}
