//! Run history feature module
//!
//! Read-only views over `etl_runs`: per-source aggregates and the most
//! recent run of each source. Nothing here can trigger a run.

pub mod queries;
pub mod routes;


pub use routes::runs_routes;
