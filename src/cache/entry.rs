//! Cache Entry Module
//!
//! Defines a stored search result together with the filters that produced it.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::FilterSet;

// == Search Payload ==
/// Result of a real query, as returned by the provider.
///
/// The cache never looks inside `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPayload {
    /// Result rows for the requested page
    pub items: Vec<Value>,
    /// Total result count reported by the provider
    pub count: u64,
    /// Provider quota/usage metadata, forwarded untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
}

impl SearchPayload {
    pub fn new(items: Vec<Value>, count: u64) -> Self {
        Self {
            items,
            count,
            usage: None,
        }
    }
}

// == Cache Entry ==
/// Represents a single cached search.
///
/// Entries are immutable once written; a new `put` for the same key replaces
/// the whole entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Canonical key (without storage prefix)
    pub key: String,
    /// Filters as actually executed
    pub filters: FilterSet,
    /// Stored result
    pub payload: SearchPayload,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), always `created_at + ttl`
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    pub fn new(key: String, filters: FilterSet, payload: SearchPayload, ttl: Duration) -> Self {
        let now = current_timestamp_ms();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            key,
            filters,
            payload,
            created_at: now,
            expires_at: now.saturating_add(ttl_ms),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is live only while `now < expires_at`, so a zero TTL entry is
    /// expired from the moment it is written.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.created_at)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.expires_at)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Converts Unix milliseconds to a UTC datetime.
pub fn millis_to_utc(ms: u64) -> Option<DateTime<Utc>> {
    i64::try_from(ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}
