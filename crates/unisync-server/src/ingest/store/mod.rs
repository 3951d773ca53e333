//! Persistence seam for the pipeline
//!
//! [`EtlStore`] hands out attempt transactions and owns the run-history writes
//! that must survive a rollback. Everything an attempt changes goes through an
//! [`EtlTransaction`] and becomes visible only on commit.

use async_trait::async_trait;

use super::config::SourceKind;
use super::error::EtlResult;
use super::models::{
    Checkpoint, EtlRun, EtlRunRow, RawRecord, UnifiedRecordDraft, UpsertOutcome,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryEtlStore;
pub use postgres::PgEtlStore;

#[async_trait]
pub trait EtlStore: Send + Sync {
    /// Open the transaction one source attempt runs in
    async fn begin(&self) -> EtlResult<Box<dyn EtlTransaction>>;

    /// Insert a RUNNING run and commit it immediately
    async fn start_run(&self, source: &str) -> EtlResult<EtlRun>;

    /// Persist a finalized run outside any attempt transaction
    async fn finish_run(&self, run: &EtlRun) -> EtlResult<()>;

    /// Most recent run per source
    async fn latest_runs(&self) -> EtlResult<Vec<EtlRunRow>>;

    async fn checkpoints(&self) -> EtlResult<Vec<Checkpoint>>;
}

#[async_trait]
pub trait EtlTransaction: Send {
    /// Take the source-scoped lease for the lifetime of this transaction
    ///
    /// Returns `false` when another attempt holds it.
    async fn try_lock_source(&mut self, source: &str) -> EtlResult<bool>;

    /// Current watermark, locking the checkpoint row until commit
    async fn read_checkpoint(&mut self, source: &str) -> EtlResult<Option<i64>>;

    /// Create or update the checkpoint row and stamp `last_run_at`
    async fn write_checkpoint(&mut self, source: &str, last_external_id: Option<i64>)
        -> EtlResult<()>;

    async fn insert_raw(&mut self, kind: SourceKind, record: &RawRecord) -> EtlResult<()>;

    /// Insert or overwrite by (source, external_id)
    async fn upsert_unified(&mut self, draft: &UnifiedRecordDraft) -> EtlResult<UpsertOutcome>;

    /// Write the terminal state of a run as part of this transaction
    async fn complete_run(&mut self, run: &EtlRun) -> EtlResult<()>;

    async fn commit(self: Box<Self>) -> EtlResult<()>;

    async fn rollback(self: Box<Self>) -> EtlResult<()>;
}
