//! Error types for the explorer cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the explorer cache.
///
/// Store-side variants never leave the cache layer. `Encoding` is returned by
/// lookups; the search path absorbs it and queries upstream uncached.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Requested filters cannot be canonicalized
    #[error("Cannot encode filters: {0}")]
    Encoding(String),

    /// A stored entry failed to deserialize
    #[error("Corrupt cache entry: {0}")]
    StoreCorruption(String),

    /// Storage capacity exhausted
    #[error("Cache storage quota exceeded: {0}")]
    StoreQuota(String),

    /// Backend I/O failure other than quota
    #[error("Cache storage error: {0}")]
    Storage(String),

    /// The upstream paid query failed
    #[error("Real query failed: {0}")]
    RealQuery(#[source] anyhow::Error),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Encoding(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::RealQuery(_) => StatusCode::BAD_GATEWAY,
            CacheError::StoreCorruption(_)
            | CacheError::StoreQuota(_)
            | CacheError::Storage(_)
            | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the explorer cache.
pub type Result<T> = std::result::Result<T, CacheError>;
