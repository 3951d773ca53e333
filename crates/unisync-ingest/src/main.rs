//! unisync ingest - Main entry point

use clap::Parser;
use std::process;
use tracing::error;
use unisync_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use unisync_ingest::commands::{self, run::RunOptions};
use unisync_ingest::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("unisync-ingest".to_string())
        .build();

    // Environment variables take precedence; the CLI works without logging
    if let Ok(log_config) = log_config.merge_env() {
        let _ = init_logging(&log_config);
    }

    if let Err(e) = execute_command(cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn execute_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run {
            sources,
            fail_fast,
            dry_run,
        } => {
            commands::run::run(RunOptions {
                sources,
                fail_fast,
                dry_run,
            })
            .await
        },
        Commands::Status { format } => commands::status::run(format).await,
    }
}
