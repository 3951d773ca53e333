//! Shared pagination utilities
//!
//! # Examples
//!
//! ```rust,ignore
//! use unisync_server::features::shared::pagination::{PaginationParams, PaginationMetadata};
//!
//! let params = PaginationParams::new(Some(2), Some(20));
//! params.validate()?;
//! let offset = params.offset();
//!
//! // After fetching data...
//! let metadata = PaginationMetadata::from_params(&params, 100);
//! ```

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;

pub const MAX_PAGE_SIZE: i64 = 100;

/// Common pagination request parameters
///
/// Out-of-range values are rejected by [`validate`](Self::validate) rather
/// than clamped.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    /// Items per page. Defaults to 10, at most 100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        Self { page, page_size }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Calculate the offset for SQL OFFSET clause
    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.page_size())
    }

    /// Validate pagination parameters
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err("page must be greater than 0");
            }
        }
        if let Some(page_size) = self.page_size {
            if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
                return Err("page_size must be between 1 and 100");
            }
        }
        Ok(())
    }
}

/// Pagination metadata for response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMetadata {
    pub page: i64,
    pub page_size: i64,
    /// Total number of matching items
    pub total: i64,
}

impl PaginationMetadata {
    pub fn from_params(params: &PaginationParams, total: i64) -> Self {
        Self {
            page: params.page(),
            page_size: params.page_size(),
            total,
        }
    }
}
