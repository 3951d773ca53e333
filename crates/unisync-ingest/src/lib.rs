//! unisync ingest CLI library
//!
//! Operator entry point for the ingestion pipeline.
//!
//! # Overview
//!
//! - **Run**: Execute the pipeline for every configured source, or only the
//!   named ones (`unisync-ingest run --source csv1`)
//! - **Dry run**: Same pipeline against an in-memory store; nothing is persisted
//! - **Status**: Latest run per source and current checkpoints
//!
//! Source settings come from the `ETL_*` environment variables, database
//! settings from `DATABASE_*`. A `.env` file in the working directory is
//! loaded first when present.

pub mod commands;
pub mod render;

use clap::{Parser, Subcommand, ValueEnum};

/// unisync - multi-source ingestion pipeline
#[derive(Parser, Debug)]
#[command(name = "unisync-ingest")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline
    Run {
        /// Only run these sources, in the given order (repeatable)
        #[arg(short, long = "source", value_name = "NAME")]
        sources: Vec<String>,

        /// Stop at the first failing source
        #[arg(long)]
        fail_fast: bool,

        /// Use an in-memory store instead of the database
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the latest run per source and the stored checkpoints
    Status {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
