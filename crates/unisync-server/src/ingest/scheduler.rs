//! Interval scheduler
//!
//! Runs the whole batch on a fixed interval inside the server process. A
//! failed batch is logged and retried at the next tick; there is no retry
//! within a tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use super::error::EtlResult;
use super::models::RunSummary;
use super::orchestrator::{BatchMode, EtlOrchestrator};

pub struct EtlScheduler {
    orchestrator: Arc<EtlOrchestrator>,
    interval: Duration,
}

impl EtlScheduler {
    pub fn new(orchestrator: Arc<EtlOrchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Start the scheduler in background
    ///
    /// The first batch runs immediately. Abort the handle to stop.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(interval_secs = self.interval.as_secs(), "ETL scheduler started");

            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once().await {
                    error!(error = %e, "Scheduled ETL batch failed");
                }
            }
        })
    }

    /// Run one batch of every configured source
    pub async fn run_once(&self) -> EtlResult<Vec<RunSummary>> {
        self.orchestrator.run_all(BatchMode::Independent).await
    }
}
