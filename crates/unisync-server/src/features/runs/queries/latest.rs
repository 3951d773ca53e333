//! Latest run per source

use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::ingest::{EtlResult, EtlRunRow, EtlStore, PgEtlStore};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRunsResponse {
    pub runs: Vec<EtlRunRow>,
}

pub async fn handle(pool: PgPool) -> EtlResult<LatestRunsResponse> {
    let runs = PgEtlStore::new(pool).latest_runs().await?;
    Ok(LatestRunsResponse { runs })
}
