//! Table rendering for terminal output

use chrono::{DateTime, Utc};
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use unisync_server::ingest::{Checkpoint, EtlRunRow, RunSummary};

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    or_dash(value.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string()))
}

/// One row per successful source attempt
pub fn summaries_table(summaries: &[RunSummary]) -> Table {
    let mut table = new_table(vec![
        "Source",
        "Run",
        "Fetched",
        "Loaded",
        "Skipped",
        "Inserted",
        "Updated",
        "Checkpoint",
    ]);

    for s in summaries {
        table.add_row(vec![
            s.source.clone(),
            s.run_id.to_string(),
            s.fetched.to_string(),
            s.loaded.to_string(),
            s.skipped.to_string(),
            s.inserted.to_string(),
            s.updated.to_string(),
            format!("{} -> {}", or_dash(s.checkpoint_before), or_dash(s.checkpoint_after)),
        ]);
    }

    table
}

pub fn runs_table(runs: &[EtlRunRow]) -> Table {
    let mut table = new_table(vec![
        "Source", "Run", "Status", "Records", "Started", "Finished", "Error",
    ]);

    for run in runs {
        table.add_row(vec![
            run.source.clone(),
            run.id.to_string(),
            run.status.clone(),
            run.records_processed.to_string(),
            timestamp(Some(run.started_at)),
            timestamp(run.finished_at),
            or_dash(run.error_message.as_deref()),
        ]);
    }

    table
}

pub fn checkpoints_table(checkpoints: &[Checkpoint]) -> Table {
    let mut table = new_table(vec!["Source", "Last external id", "Last run"]);

    for cp in checkpoints {
        table.add_row(vec![
            cp.source.clone(),
            or_dash(cp.last_external_id),
            timestamp(Some(cp.last_run_at)),
        ]);
    }

    table
}
