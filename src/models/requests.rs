//! Request DTOs for the explorer cache API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

use crate::cache::FilterSet;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Request body for a search (POST /search)
///
/// # Fields
/// - `filters`: Search constraints; unknown filter names are rejected
/// - `page`: 1-based page number (default 1)
/// - `size`: Page size (server default if not specified)
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub filters: FilterSet,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl SearchRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.page == Some(0) {
            return Some("Page numbers start at 1".to_string());
        }
        match self.size {
            Some(0) => Some("Page size must be positive".to_string()),
            Some(size) if size > MAX_PAGE_SIZE => Some(format!(
                "Page size exceeds maximum of {}",
                MAX_PAGE_SIZE
            )),
            _ => None,
        }
    }
}

/// Query string for GET /cache/popular
#[derive(Debug, Clone, Deserialize)]
pub struct PopularQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}
