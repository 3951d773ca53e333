//! `unisync-ingest status` command implementation
//!
//! Shows the latest run of each source and the stored checkpoints.

use anyhow::Result;
use colored::Colorize;
use serde_json::json;
use unisync_server::ingest::{EtlStore, PgEtlStore};

use crate::{render, OutputFormat};

pub async fn run(format: OutputFormat) -> Result<()> {
    let store = PgEtlStore::new(super::connect().await?);
    report(&store, format).await
}

/// Print the status of any store
pub async fn report(store: &dyn EtlStore, format: OutputFormat) -> Result<()> {
    let runs = store.latest_runs().await?;
    let checkpoints = store.checkpoints().await?;

    match format {
        OutputFormat::Json => {
            let body = json!({ "runs": runs, "checkpoints": checkpoints });
            println!("{}", serde_json::to_string_pretty(&body)?);
        },
        OutputFormat::Table => {
            if runs.is_empty() {
                println!("No runs recorded yet.");
                println!("Run 'unisync-ingest run' to start the pipeline.");
                return Ok(());
            }

            println!("{}", "Latest runs:".cyan().bold());
            println!("{}", render::runs_table(&runs));
            println!();
            println!("{}", "Checkpoints:".cyan().bold());
            println!("{}", render::checkpoints_table(&checkpoints));
        },
    }

    Ok(())
}
