//! Response DTOs for the explorer cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::cache::{millis_to_utc, CacheEntry, LookupStats, SearchPayload, StoreStats};
use crate::explorer::{PopularSearch, PrefetchStats};

/// Response body for a search (POST /search)
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Result rows
    pub items: Vec<Value>,
    /// Total result count reported by the provider
    pub count: u64,
    pub page: u32,
    pub size: u32,
    /// Whether the result came from the cache
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_info: Option<CacheInfo>,
}

/// How a search was answered.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    /// True when a broader cached search answered the request
    pub compatible_match: bool,
    /// Specificity score of the compatible entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Provider quota/usage metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

impl SearchResponse {
    /// Response served from a cache entry; `score` is set for compatible hits.
    pub fn from_cache(entry: CacheEntry, score: Option<u32>, page: u32, size: u32) -> Self {
        let cache_info = CacheInfo {
            compatible_match: score.is_some(),
            score,
            cached_at: entry.created_at_utc(),
            expires_at: entry.expires_at_utc(),
            usage: entry.payload.usage,
        };
        Self {
            items: entry.payload.items,
            count: entry.payload.count,
            page,
            size,
            cached: true,
            cache_info: Some(cache_info),
        }
    }

    /// Response for a real query result.
    pub fn fresh(payload: SearchPayload, page: u32, size: u32) -> Self {
        let cache_info = payload.usage.map(|usage| CacheInfo {
            compatible_match: false,
            score: None,
            cached_at: None,
            expires_at: None,
            usage: Some(usage),
        });
        Self {
            items: payload.items,
            count: payload.count,
            page,
            size,
            cached: false,
            cache_info,
        }
    }
}

/// Response body for the stats endpoint (GET /cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_entries: usize,
    pub total_size_bytes: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    pub exact_hits: u64,
    pub compatible_hits: u64,
    pub misses: u64,
    pub skipped_writes: u64,
    /// Hit rate ((exact + compatible) / all lookups)
    pub hit_rate: f64,
    pub prefetch: PrefetchStats,
}

impl StatsResponse {
    pub fn new(store: StoreStats, lookups: LookupStats, prefetch: PrefetchStats) -> Self {
        Self {
            total_entries: store.total_entries,
            total_size_bytes: store.total_size_bytes,
            oldest_entry: store.oldest_entry.and_then(millis_to_utc),
            newest_entry: store.newest_entry.and_then(millis_to_utc),
            hit_rate: lookups.hit_rate(),
            exact_hits: lookups.exact_hits,
            compatible_hits: lookups.compatible_hits,
            misses: lookups.misses,
            skipped_writes: lookups.skipped_writes,
            prefetch,
        }
    }
}

/// Response body for DELETE /cache
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub removed: usize,
}

impl ClearResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Removed {} cached searches", removed),
            removed,
        }
    }
}

/// Response body for GET /cache/popular
#[derive(Debug, Clone, Serialize)]
pub struct PopularResponse {
    pub searches: Vec<PopularSearch>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
