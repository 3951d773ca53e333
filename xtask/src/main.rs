//! Build automation tasks for unisync
//!
//! - Generating the `unisync-ingest` CLI reference from its clap definitions

use clap::Parser;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Build automation tasks for unisync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Generate the CLI reference in Markdown
    GenerateCliDocs {
        /// Output directory for generated documentation
        #[arg(short, long, default_value = "docs")]
        output_dir: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::GenerateCliDocs { output_dir } => generate_cli_docs(&output_dir)?,
    }

    Ok(())
}

fn generate_cli_docs(output_dir: &str) -> anyhow::Result<()> {
    println!("Generating CLI documentation...");

    let markdown = clap_markdown::help_markdown::<unisync_ingest::Cli>();

    let content = format!(
        r#"# unisync-ingest CLI Reference

Generated from the CLI source code on {}.

## Overview

`unisync-ingest` runs the ingestion pipeline on demand and reports run history.
Each configured source is fetched, captured raw, transformed and upserted into
`unified_records` inside a single transaction per source.

## Quick Start

```bash
# Run every configured source
unisync-ingest run

# Run one source without touching the database
unisync-ingest run --source csv1 --dry-run

# Latest run per source and stored checkpoints
unisync-ingest status
```

## Commands

{}

## Environment Variables

- `DATABASE_URL` - PostgreSQL connection string
- `ETL_SOURCES` - Ordered `name[:kind]` list (default: `api,csv1,csv2`)
- `ETL_API_SOURCE_URL`, `ETL_API_KEY`, `ETL_API_TIMEOUT_SECS` - Remote market API
- `ETL_CSV1_PATH`, `ETL_CSV2_PATH` - Delimited source files
- `ETL_ON_MALFORMED_<NAME>` - `skip` or `abort`
- `LOG_LEVEL`, `LOG_FORMAT`, `LOG_OUTPUT` - Logging

---

*To update, run `cargo xtask generate-cli-docs`.*
"#,
        chrono::Utc::now().format("%Y-%m-%d"),
        markdown
    );

    let output_path = PathBuf::from(output_dir);
    fs::create_dir_all(&output_path)?;

    let file_path = output_path.join("cli-reference.md");
    fs::write(&file_path, content)?;

    println!("Generated CLI documentation at: {}", file_path.display());

    Ok(())
}
