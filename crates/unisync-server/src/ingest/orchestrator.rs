//! Pipeline orchestrator
//!
//! Runs each configured source as one attempt:
//!
//! 1. open the attempt transaction and take the source lease
//! 2. commit a RUNNING run row
//! 3. read checkpoint, fetch, capture raw, transform, upsert
//! 4. write the new checkpoint and the SUCCESS row, commit
//!
//! Any error rolls the attempt back, then a FAILURE row is committed on its
//! own and the error is returned to the caller.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::config::{EtlConfig, SourceConfig};
use super::error::{EtlError, EtlResult};
use super::models::{EtlRun, RunSummary, UpsertOutcome};
use super::raw;
use super::sources::{build_adapter, SourceAdapter};
use super::store::{EtlStore, EtlTransaction};
use super::transform::Transformer;

/// How a batch reacts to a failed source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Attempt every source, then report all failures together
    #[default]
    Independent,
    /// Stop at the first failed source
    FailFast,
}

pub struct EtlOrchestrator {
    config: EtlConfig,
    store: Arc<dyn EtlStore>,
    adapters: HashMap<String, Arc<dyn SourceAdapter>>,
}

impl EtlOrchestrator {
    /// Create an orchestrator with one adapter per configured source
    pub fn new(config: EtlConfig, store: Arc<dyn EtlStore>) -> EtlResult<Self> {
        config.validate()?;

        let mut adapters = HashMap::new();
        for source in &config.sources {
            adapters.insert(source.name.clone(), build_adapter(source, &config)?);
        }

        Ok(Self {
            config,
            store,
            adapters,
        })
    }

    /// Replace the adapter used for a configured source
    pub fn with_adapter(mut self, name: &str, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(name.to_lowercase(), adapter);
        self
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn EtlStore> {
        &self.store
    }

    /// Run every configured source in configured order
    pub async fn run_all(&self, mode: BatchMode) -> EtlResult<Vec<RunSummary>> {
        let sources: Vec<&SourceConfig> = self.config.sources.iter().collect();
        self.run_batch(&sources, mode).await
    }

    /// Run the named sources in the given order
    ///
    /// Every name is resolved before any source runs.
    pub async fn run_sources(&self, names: &[String], mode: BatchMode) -> EtlResult<Vec<RunSummary>> {
        let sources = names
            .iter()
            .map(|name| self.resolve(name))
            .collect::<EtlResult<Vec<_>>>()?;
        self.run_batch(&sources, mode).await
    }

    /// Run a single source
    pub async fn run_source(&self, name: &str) -> EtlResult<RunSummary> {
        let source = self.resolve(name)?;
        self.run_one(source).await
    }

    fn resolve(&self, name: &str) -> EtlResult<&SourceConfig> {
        self.config
            .source(name)
            .ok_or_else(|| EtlError::UnknownSource(name.to_string()))
    }

    async fn run_batch(
        &self,
        sources: &[&SourceConfig],
        mode: BatchMode,
    ) -> EtlResult<Vec<RunSummary>> {
        info!(sources = sources.len(), ?mode, "Starting ETL batch");

        let mut summaries = Vec::with_capacity(sources.len());
        let mut failures = Vec::new();

        for source in sources {
            match self.run_one(source).await {
                Ok(summary) => summaries.push(summary),
                Err(e) if mode == BatchMode::FailFast => return Err(e),
                Err(e) => failures.push((source.name.clone(), e.to_string())),
            }
        }

        info!(
            succeeded = summaries.len(),
            failed = failures.len(),
            "ETL batch completed"
        );

        if failures.is_empty() {
            Ok(summaries)
        } else {
            Err(EtlError::BatchFailed { failures })
        }
    }

    async fn run_one(&self, source: &SourceConfig) -> EtlResult<RunSummary> {
        let adapter = self
            .adapters
            .get(&source.name)
            .cloned()
            .ok_or_else(|| EtlError::UnknownSource(source.name.clone()))?;

        let mut tx = self.store.begin().await?;

        let leased = match tx.try_lock_source(&source.name).await {
            Ok(leased) => leased,
            Err(e) => {
                discard(tx, &source.name).await;
                return Err(e);
            },
        };
        if !leased {
            discard(tx, &source.name).await;
            let busy = EtlError::SourceBusy(source.name.clone());
            let run = self.store.start_run(&source.name).await?;
            self.record_failure(run, &busy).await;
            return Err(busy);
        }

        let run = match self.store.start_run(&source.name).await {
            Ok(run) => run,
            Err(e) => {
                discard(tx, &source.name).await;
                return Err(e);
            },
        };
        info!(source = %source.name, run_id = run.id, "Run started");

        let attempted = self.attempt(source, adapter.as_ref(), &run, tx.as_mut()).await;
        let outcome = match attempted {
            Ok(summary) => tx.commit().await.map(|()| summary),
            Err(e) => {
                discard(tx, &source.name).await;
                Err(e)
            },
        };

        match outcome {
            Ok(summary) => {
                info!(
                    source = %source.name,
                    run_id = run.id,
                    records = summary.loaded,
                    skipped = summary.skipped,
                    checkpoint = ?summary.checkpoint_after,
                    "Run succeeded"
                );
                Ok(summary)
            },
            Err(e) => {
                error!(source = %source.name, run_id = run.id, error = %e, "Run failed");
                self.record_failure(run, &e).await;
                Err(e)
            },
        }
    }

    async fn attempt(
        &self,
        source: &SourceConfig,
        adapter: &dyn SourceAdapter,
        run: &EtlRun,
        tx: &mut dyn EtlTransaction,
    ) -> EtlResult<RunSummary> {
        let checkpoint_before = tx.read_checkpoint(&source.name).await?;
        let payloads = adapter.fetch(checkpoint_before).await?;

        let captured_ids = raw::persist(&mut *tx, source.kind, &payloads).await?;

        let output = Transformer::for_source(source).map_all(&payloads)?;

        let (mut inserted, mut updated) = (0, 0);
        for draft in &output.drafts {
            match tx.upsert_unified(draft).await? {
                UpsertOutcome::Inserted => inserted += 1,
                UpsertOutcome::Updated => updated += 1,
            }
        }

        let checkpoint_after = raw::next_watermark(checkpoint_before, &captured_ids);
        tx.write_checkpoint(&source.name, checkpoint_after).await?;

        let mut finished = run.clone();
        finished.succeed(output.drafts.len() as i64)?;
        tx.complete_run(&finished).await?;

        Ok(RunSummary {
            run_id: run.id,
            source: source.name.clone(),
            fetched: payloads.len(),
            captured: payloads.len(),
            loaded: output.drafts.len(),
            skipped: output.skipped,
            inserted,
            updated,
            checkpoint_before,
            checkpoint_after,
        })
    }

    async fn record_failure(&self, mut run: EtlRun, cause: &EtlError) {
        if let Err(e) = run.fail(cause.to_string()) {
            warn!(run_id = run.id, error = %e, "Run already finalized");
            return;
        }
        if let Err(e) = self.store.finish_run(&run).await {
            error!(run_id = run.id, error = %e, "Failed to record run failure");
        }
    }
}

async fn discard(tx: Box<dyn EtlTransaction>, source: &str) {
    if let Err(e) = tx.rollback().await {
        warn!(source, error = %e, "Rollback failed");
    }
}
