//! Cache Module
//!
//! Filter-keyed result storage with TTL expiration and compatibility matching.

mod backend;
mod entry;
mod filter;
mod stats;
mod store;

pub mod key;
pub mod matcher;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use entry::{current_timestamp_ms, millis_to_utc, CacheEntry, SearchPayload};
pub use filter::{FieldKind, FilterField, FilterSet, FilterValue};
pub use key::{canonicalize, KEY_PREFIX};
pub use matcher::{evaluate, MatchResult};
pub use stats::{LookupStats, StoreStats};
pub use store::{CacheStore, LiveEntries, PutOutcome};
