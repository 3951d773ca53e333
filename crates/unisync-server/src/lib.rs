//! unisync server library
//!
//! Multi-source ingestion pipeline and the read-only HTTP API over its output.
//!
//! # Overview
//!
//! - **Ingestion**: Pulls a remote market API and two delimited files, captures
//!   raw payloads, normalizes them into `unified_records` and tracks every
//!   attempt in `etl_runs`
//! - **API Endpoints**: `/data`, `/health`, `/stats` and `/runs/latest`
//! - **Database Management**: PostgreSQL integration with SQLx
//! - **Configuration**: Environment-based configuration management
//! - **Middleware**: CORS, request logging and compression
//!
//! # Architecture
//!
//! Each source is processed in its own database transaction. Raw capture,
//! unified upserts, the checkpoint and the SUCCESS run row commit together;
//! any failure rolls all of them back and leaves a FAILURE run row behind.
//!
//! ## Framework Stack
//!
//! - **Axum**: Web framework
//! - **SQLx**: Runtime-checked SQL and migrations
//! - **Tower**: Middleware and service abstractions
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use unisync_server::{config::Config, db, ingest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&(&config.database).into()).await?;
//!     db::run_migrations(&pool).await?;
//!
//!     let store = Arc::new(ingest::PgEtlStore::new(pool));
//!     let orchestrator = ingest::EtlOrchestrator::new(config.etl, store)?;
//!     orchestrator.run_all(ingest::BatchMode::Independent).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod ingest;
pub mod middleware;

// Re-export commonly used types
pub use error::{AppError, AppResult};
