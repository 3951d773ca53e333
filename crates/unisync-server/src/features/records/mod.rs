//! Unified records feature module
//!
//! Paged, read-only access to the rows produced by the pipeline.

pub mod queries;
pub mod routes;


pub use routes::records_routes;
