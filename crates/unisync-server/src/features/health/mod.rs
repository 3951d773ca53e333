//! Health feature module
//!
//! Reports database reachability and the outcome of the most recent
//! finished pipeline run.

pub mod routes;

pub use routes::{health_routes, HealthResponse, LastRun};
