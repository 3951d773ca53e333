//! PostgreSQL store tests
//!
//! Run with `DATABASE_URL` pointing at a server the test user may create
//! databases on: `cargo test -p unisync-server --test pg_store_tests -- --ignored`

mod helpers;

use chrono::{TimeZone, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use unisync_server::ingest::{
    BatchMode, EtlOrchestrator, EtlStore, PgEtlStore, RawRecord, SourceKind, UnifiedRecordDraft,
    UpsertOutcome,
};

use helpers::*;

fn draft(external_id: &str, value: i64) -> UnifiedRecordDraft {
    UnifiedRecordDraft::new(
        "csv1",
        external_id.to_string(),
        Some(format!("Coin {external_id}")),
        Some(value),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_upsert_inserts_then_updates(pool: PgPool) -> sqlx::Result<()> {
    let store = PgEtlStore::new(pool.clone());

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.upsert_unified(&draft("1", 10)).await.unwrap(), UpsertOutcome::Inserted);
    assert_eq!(tx.upsert_unified(&draft("1", 20)).await.unwrap(), UpsertOutcome::Updated);
    tx.commit().await.unwrap();

    let value: Option<i64> =
        sqlx::query_scalar("SELECT value FROM unified_records WHERE source = 'csv1' AND external_id = '1'")
            .fetch_one(&pool)
            .await?;
    assert_eq!(value, Some(20));
    assert_eq!(count(&pool, "unified_records").await, 1);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_rollback_discards_attempt(pool: PgPool) -> sqlx::Result<()> {
    let store = PgEtlStore::new(pool.clone());

    let mut tx = store.begin().await.unwrap();
    tx.insert_raw(SourceKind::Csv1, &RawRecord::new(Some(1), json!({"id": "1"})))
        .await
        .unwrap();
    tx.upsert_unified(&draft("1", 10)).await.unwrap();
    tx.write_checkpoint("csv1", Some(1)).await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(count(&pool, "raw_csv_records").await, 0);
    assert_eq!(count(&pool, "unified_records").await, 0);
    assert_eq!(count(&pool, "checkpoints").await, 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_source_lease_is_exclusive(pool: PgPool) -> sqlx::Result<()> {
    let store = PgEtlStore::new(pool);

    let mut first = store.begin().await.unwrap();
    let mut second = store.begin().await.unwrap();

    assert!(first.try_lock_source("csv1").await.unwrap());
    assert!(!second.try_lock_source("csv1").await.unwrap());
    assert!(second.try_lock_source("csv2").await.unwrap());

    first.rollback().await.unwrap();
    second.rollback().await.unwrap();
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_run_lifecycle_rows(pool: PgPool) -> sqlx::Result<()> {
    let store = PgEtlStore::new(pool);

    let mut run = store.start_run("csv2").await.unwrap();
    let running = store.latest_runs().await.unwrap();
    assert_eq!(running[0].status, "RUNNING");
    assert!(running[0].finished_at.is_none());

    run.fail("boom").unwrap();
    store.finish_run(&run).await.unwrap();

    let finished = store.latest_runs().await.unwrap();
    assert_eq!(finished[0].status, "FAILURE");
    assert_eq!(finished[0].error_message.as_deref(), Some("boom"));
    assert!(finished[0].finished_at.is_some());
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore] // Requires database
async fn test_pipeline_against_postgres(pool: PgPool) -> sqlx::Result<()> {
    let csv1 = csv_file(&csv1_rows(&[1, 2, 3]));
    let csv2 = csv_file(CSV2_ROWS);
    let config = etl_config(&[
        ("ETL_SOURCES", "csv1,csv2".to_string()),
        ("ETL_CSV1_PATH", csv1.path().display().to_string()),
        ("ETL_CSV2_PATH", csv2.path().display().to_string()),
    ]);
    let store = Arc::new(PgEtlStore::new(pool.clone()));
    let orchestrator = EtlOrchestrator::new(config, store.clone()).unwrap();

    orchestrator.run_all(BatchMode::Independent).await.unwrap();
    orchestrator.run_all(BatchMode::Independent).await.unwrap();

    assert_eq!(count(&pool, "unified_records").await, 5);
    assert_eq!(count(&pool, "raw_csv_records").await, 3);
    assert_eq!(count(&pool, "raw_csv2_records").await, 2);

    let checkpoints = store.checkpoints().await.unwrap();
    let csv1_checkpoint = checkpoints.iter().find(|c| c.source == "csv1").unwrap();
    assert_eq!(csv1_checkpoint.last_external_id, Some(3));

    let runs = store.latest_runs().await.unwrap();
    assert!(runs.iter().all(|r| r.status == "SUCCESS"));
    assert_eq!(count(&pool, "etl_runs").await, 4);
    Ok(())
}
