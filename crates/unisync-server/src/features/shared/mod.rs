//! Shared utilities and types for feature modules
//!
//! # Contents
//!
//! - **pagination**: Page/page-size parameters and response metadata
//! - **response**: Request metadata attached to list responses
//! - **test_helpers**: Row builders for database tests (test-only)

pub mod pagination;
pub mod response;

#[cfg(test)]
pub mod test_helpers;

// Re-export commonly used types
pub use pagination::{PaginationMetadata, PaginationParams};
pub use response::{RequestMeta, RequestTimer};
