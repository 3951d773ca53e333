//! Feature modules implementing the unisync read API
//!
//! Each feature is a vertical slice with its own queries and routes. All
//! slices are read-only; data only changes through the pipeline.
//!
//! # Features
//!
//! - **records**: Paged listing of unified records (`/data`)
//! - **runs**: Run statistics and latest run per source (`/stats`, `/runs/latest`)
//! - **health**: Database reachability and last finished run (`/health`)
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions

pub mod health;
pub mod records;
pub mod runs;
pub mod shared;

use axum::Router;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    /// PostgreSQL connection pool
    pub db: sqlx::PgPool,
}

/// Creates the API router with all feature routes mounted at the root
pub fn router(state: FeatureState) -> Router<()> {
    Router::new()
        .merge(records::records_routes())
        .merge(runs::runs_routes())
        .merge(health::health_routes())
        .with_state(state.db)
}
