//! Test helpers for unisync server integration tests
//!
//! This module provides utilities for:
//! - Tracing setup
//! - Temporary source files and configuration
//! - In-memory pipelines
//! - A store wrapper that fails on demand

#![allow(dead_code)]

pub mod fixtures;

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;
use unisync_server::ingest::{
    Checkpoint, EtlConfig, EtlError, EtlOrchestrator, EtlResult, EtlRun, EtlRunRow, EtlStore,
    EtlTransaction, MemoryEtlStore, RawRecord, SourceKind, UnifiedRecordDraft, UpsertOutcome,
};

// Re-export fixtures for convenience
pub use fixtures::*;

/// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,unisync_server=debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Write `contents` to a temporary file that lives as long as the handle
pub fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Replace the contents of an existing temporary file
pub fn rewrite(file: &NamedTempFile, contents: &str) {
    std::fs::write(file.path(), contents).unwrap();
}

/// Pipeline configuration from explicit `ETL_*` values
pub fn etl_config(vars: &[(&str, String)]) -> EtlConfig {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    EtlConfig::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// Orchestrator over the two delimited sources and an in-memory store
pub struct CsvPipeline {
    pub csv1: NamedTempFile,
    pub csv2: NamedTempFile,
    pub store: MemoryEtlStore,
    pub orchestrator: EtlOrchestrator,
}

impl CsvPipeline {
    pub fn new(csv1: &str, csv2: &str) -> Self {
        Self::with_vars(csv1, csv2, &[])
    }

    /// Extra `ETL_*` values on top of the source list and file paths
    pub fn with_vars(csv1: &str, csv2: &str, extra: &[(&str, String)]) -> Self {
        let csv1 = csv_file(csv1);
        let csv2 = csv_file(csv2);

        let mut vars = vec![
            ("ETL_SOURCES", "csv1,csv2".to_string()),
            ("ETL_CSV1_PATH", csv1.path().display().to_string()),
            ("ETL_CSV2_PATH", csv2.path().display().to_string()),
        ];
        vars.extend(extra.iter().cloned());

        let store = MemoryEtlStore::new();
        let orchestrator =
            EtlOrchestrator::new(etl_config(&vars), Arc::new(store.clone())).unwrap();

        Self {
            csv1,
            csv2,
            store,
            orchestrator,
        }
    }

    pub fn run_statuses(&self, source: &str) -> Vec<String> {
        self.store
            .runs()
            .into_iter()
            .filter(|run| run.source == source)
            .map(|run| run.status)
            .collect()
    }
}

/// Store whose attempt transactions fail after a fixed number of upserts
pub struct FailingUpsertStore {
    inner: MemoryEtlStore,
    allowed_upserts: usize,
    attempts: Arc<AtomicUsize>,
}

impl FailingUpsertStore {
    pub fn new(inner: MemoryEtlStore, allowed_upserts: usize) -> Self {
        Self {
            inner,
            allowed_upserts,
            attempts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Upserts attempted across all transactions
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EtlStore for FailingUpsertStore {
    async fn begin(&self) -> EtlResult<Box<dyn EtlTransaction>> {
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin().await?,
            remaining: self.allowed_upserts,
            attempts: Arc::clone(&self.attempts),
        }))
    }

    async fn start_run(&self, source: &str) -> EtlResult<EtlRun> {
        self.inner.start_run(source).await
    }

    async fn finish_run(&self, run: &EtlRun) -> EtlResult<()> {
        self.inner.finish_run(run).await
    }

    async fn latest_runs(&self) -> EtlResult<Vec<EtlRunRow>> {
        self.inner.latest_runs().await
    }

    async fn checkpoints(&self) -> EtlResult<Vec<Checkpoint>> {
        self.inner.checkpoints().await
    }
}

struct FailingTransaction {
    inner: Box<dyn EtlTransaction>,
    remaining: usize,
    attempts: Arc<AtomicUsize>,
}

#[async_trait]
impl EtlTransaction for FailingTransaction {
    async fn try_lock_source(&mut self, source: &str) -> EtlResult<bool> {
        self.inner.try_lock_source(source).await
    }

    async fn read_checkpoint(&mut self, source: &str) -> EtlResult<Option<i64>> {
        self.inner.read_checkpoint(source).await
    }

    async fn write_checkpoint(
        &mut self,
        source: &str,
        last_external_id: Option<i64>,
    ) -> EtlResult<()> {
        self.inner.write_checkpoint(source, last_external_id).await
    }

    async fn insert_raw(&mut self, kind: SourceKind, record: &RawRecord) -> EtlResult<()> {
        self.inner.insert_raw(kind, record).await
    }

    async fn upsert_unified(&mut self, draft: &UnifiedRecordDraft) -> EtlResult<UpsertOutcome> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.remaining == 0 {
            return Err(EtlError::Store(sqlx::Error::Protocol(
                "injected upsert failure".to_string(),
            )));
        }
        self.remaining -= 1;
        self.inner.upsert_unified(draft).await
    }

    async fn complete_run(&mut self, run: &EtlRun) -> EtlResult<()> {
        self.inner.complete_run(run).await
    }

    async fn commit(self: Box<Self>) -> EtlResult<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> EtlResult<()> {
        self.inner.rollback().await
    }
}
