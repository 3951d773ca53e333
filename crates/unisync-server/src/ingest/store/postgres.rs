//! PostgreSQL store
//!
//! The per-source lease is a transaction-scoped advisory lock, so it is
//! released by commit, rollback, or the connection going away.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{EtlStore, EtlTransaction};
use crate::ingest::config::SourceKind;
use crate::ingest::error::EtlResult;
use crate::ingest::models::{
    Checkpoint, EtlRun, EtlRunRow, RawRecord, RunState, UnifiedRecordDraft, UpsertOutcome,
};

#[derive(Clone)]
pub struct PgEtlStore {
    pool: PgPool,
}

impl PgEtlStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

const UPDATE_RUN: &str = r#"
    UPDATE etl_runs
    SET status = $2, records_processed = $3, error_message = $4, finished_at = $5
    WHERE id = $1
"#;

fn update_run_query(run: &EtlRun) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(UPDATE_RUN)
        .bind(run.id)
        .bind(run.status().as_str())
        .bind(run.records_processed())
        .bind(run.error_message())
        .bind(run.finished_at)
}

#[async_trait]
impl EtlStore for PgEtlStore {
    async fn begin(&self) -> EtlResult<Box<dyn EtlTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgEtlTransaction { tx }))
    }

    async fn start_run(&self, source: &str) -> EtlResult<EtlRun> {
        let (id, started_at): (i64, DateTime<Utc>) = sqlx::query_as(
            r#"
            INSERT INTO etl_runs (source, status, records_processed, started_at)
            VALUES ($1, 'RUNNING', 0, NOW())
            RETURNING id, started_at
            "#,
        )
        .bind(source)
        .fetch_one(&self.pool)
        .await?;

        Ok(EtlRun {
            id,
            source: source.to_string(),
            state: RunState::Running,
            started_at,
            finished_at: None,
        })
    }

    async fn finish_run(&self, run: &EtlRun) -> EtlResult<()> {
        update_run_query(run).execute(&self.pool).await?;
        Ok(())
    }

    async fn latest_runs(&self) -> EtlResult<Vec<EtlRunRow>> {
        let rows = sqlx::query_as::<_, EtlRunRow>(
            r#"
            SELECT DISTINCT ON (source)
                id, source, status, records_processed, error_message, started_at, finished_at
            FROM etl_runs
            ORDER BY source, started_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn checkpoints(&self) -> EtlResult<Vec<Checkpoint>> {
        let rows = sqlx::query_as::<_, Checkpoint>(
            "SELECT source, last_external_id, last_run_at FROM checkpoints ORDER BY source",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

pub struct PgEtlTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl EtlTransaction for PgEtlTransaction {
    async fn try_lock_source(&mut self, source: &str) -> EtlResult<bool> {
        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock(hashtext($1))")
            .bind(source)
            .fetch_one(&mut *self.tx)
            .await?;

        debug!(source, acquired, "Source lease");
        Ok(acquired)
    }

    async fn read_checkpoint(&mut self, source: &str) -> EtlResult<Option<i64>> {
        let row: Option<Option<i64>> = sqlx::query_scalar(
            "SELECT last_external_id FROM checkpoints WHERE source = $1 FOR UPDATE",
        )
        .bind(source)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row.flatten())
    }

    async fn write_checkpoint(
        &mut self,
        source: &str,
        last_external_id: Option<i64>,
    ) -> EtlResult<()> {
        sqlx::query(
            r#"
            INSERT INTO checkpoints (source, last_external_id, last_run_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (source) DO UPDATE
            SET last_external_id = EXCLUDED.last_external_id,
                last_run_at = EXCLUDED.last_run_at
            "#,
        )
        .bind(source)
        .bind(last_external_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_raw(&mut self, kind: SourceKind, record: &RawRecord) -> EtlResult<()> {
        let sql = format!(
            "INSERT INTO {} (external_id, payload, received_at) VALUES ($1, $2, $3)",
            kind.raw_table()
        );

        sqlx::query(&sql)
            .bind(record.external_id)
            .bind(&record.payload)
            .bind(record.received_at)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn upsert_unified(&mut self, draft: &UnifiedRecordDraft) -> EtlResult<UpsertOutcome> {
        // xmax is 0 only for a freshly inserted tuple
        let inserted: bool = sqlx::query_scalar(
            r#"
            INSERT INTO unified_records (source, external_id, name, value, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT ON CONSTRAINT uix_source_external DO UPDATE
            SET name = EXCLUDED.name,
                value = EXCLUDED.value,
                timestamp = EXCLUDED.timestamp
            RETURNING (xmax = 0)
            "#,
        )
        .bind(draft.source())
        .bind(draft.external_id())
        .bind(draft.name())
        .bind(draft.value())
        .bind(draft.timestamp())
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn complete_run(&mut self, run: &EtlRun) -> EtlResult<()> {
        update_run_query(run).execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> EtlResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> EtlResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
