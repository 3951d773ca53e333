//! `unisync-ingest run` command implementation

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use unisync_server::ingest::{
    BatchMode, EtlConfig, EtlOrchestrator, EtlResult, EtlStore, MemoryEtlStore, PgEtlStore,
    RunSummary,
};

use crate::render;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Sources to run; empty means all configured sources
    pub sources: Vec<String>,
    pub fail_fast: bool,
    pub dry_run: bool,
}

impl RunOptions {
    pub fn mode(&self) -> BatchMode {
        if self.fail_fast {
            BatchMode::FailFast
        } else {
            BatchMode::Independent
        }
    }
}

/// Run the pipeline and print a summary
///
/// Returns an error when any source failed, after printing the latest run
/// of every source so the failures are visible.
pub async fn run(options: RunOptions) -> Result<()> {
    let config = EtlConfig::from_env()?;

    let store: Arc<dyn EtlStore> = if options.dry_run {
        info!("Dry run, using the in-memory store");
        Arc::new(MemoryEtlStore::new())
    } else {
        Arc::new(PgEtlStore::new(super::connect().await?))
    };

    let orchestrator = EtlOrchestrator::new(config, store)?;

    match execute(&orchestrator, &options).await {
        Ok(summaries) => {
            println!("{}", render::summaries_table(&summaries));
            Ok(())
        },
        Err(e) => {
            match orchestrator.store().latest_runs().await {
                Ok(runs) if !runs.is_empty() => println!("{}", render::runs_table(&runs)),
                Ok(_) => {},
                Err(store_err) => warn!(error = %store_err, "Could not read run history"),
            }
            Err(e.into())
        },
    }
}

/// Run the selected sources through an existing orchestrator
pub async fn execute(
    orchestrator: &EtlOrchestrator,
    options: &RunOptions,
) -> EtlResult<Vec<RunSummary>> {
    if options.sources.is_empty() {
        orchestrator.run_all(options.mode()).await
    } else {
        orchestrator.run_sources(&options.sources, options.mode()).await
    }
}
