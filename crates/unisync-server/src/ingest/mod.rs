//! Data ingestion pipeline
//!
//! Incrementally pulls records from the configured sources, captures them raw,
//! normalizes them into `unified_records` and tracks every attempt in
//! `etl_runs`.
//!
//! # Architecture
//!
//! - **config**: Source list and per-source settings (`ETL_*` environment variables)
//! - **sources**: One adapter per source kind (remote API, two delimited files)
//! - **raw**: Append-only raw capture and provenance ids
//! - **transform**: Raw payload to canonical draft, with per-source malformed-record policy
//! - **store**: Transactional persistence seam (PostgreSQL, in-memory)
//! - **models**: Drafts, checkpoints and the run state machine
//! - **orchestrator**: Sequences one attempt per source with rollback on failure
//! - **scheduler**: Optional interval runner inside the server
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unisync_server::ingest::{BatchMode, EtlConfig, EtlOrchestrator, MemoryEtlStore};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let orchestrator = EtlOrchestrator::new(EtlConfig::from_env()?, Arc::new(MemoryEtlStore::new()))?;
//! for summary in orchestrator.run_all(BatchMode::Independent).await? {
//!     println!("{}: {} records", summary.source, summary.loaded);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod raw;
pub mod scheduler;
pub mod sources;
pub mod store;
pub mod transform;

pub use config::{EtlConfig, MalformedPolicy, SourceConfig, SourceKind};
pub use error::{EtlError, EtlResult, SkipReason};
pub use models::{
    Checkpoint, EtlRun, EtlRunRow, RawRecord, RunState, RunStatus, RunSummary, UnifiedRecord,
    UnifiedRecordDraft, UpsertOutcome,
};
pub use orchestrator::{BatchMode, EtlOrchestrator};
pub use scheduler::EtlScheduler;
pub use sources::SourceAdapter;
pub use store::{EtlStore, EtlTransaction, MemoryEtlStore, PgEtlStore};
pub use transform::Transformer;
