//! Cache Store Module
//!
//! Entry storage with per-entry TTL on top of a pluggable [`StorageBackend`].
//! Entries are serialized as JSON under `explorer_cache_<key>`.
//!
//! Storage failures never escape this module: corrupt entries are deleted and
//! treated as absent, failed writes are reported as [`PutOutcome::Skipped`].

use std::time::Duration;
use std::vec;

use tracing::{debug, warn};

use crate::cache::entry::current_timestamp_ms;
use crate::cache::key::{storage_key, KEY_PREFIX};
use crate::cache::{
    CacheEntry, FilterSet, MemoryBackend, SearchPayload, StorageBackend, StoreStats,
};
use crate::error::{CacheError, Result};

// == Put Outcome ==
/// Result of a `put`. A skipped write is a warning, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    Stored,
    Skipped(String),
}

impl PutOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, PutOutcome::Stored)
    }
}

// == Cache Store ==
/// Cache storage with TTL expiry and lazy reaping.
#[derive(Debug)]
pub struct CacheStore {
    backend: Box<dyn StorageBackend>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store over the given backend.
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Creates an unbounded in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    // == Put ==
    /// Stores or overwrites an entry expiring `ttl` from now.
    ///
    /// Backend failures (quota, I/O) are logged and returned as
    /// `PutOutcome::Skipped`; the cache then simply behaves as a miss.
    pub fn put(
        &mut self,
        key: &str,
        filters: FilterSet,
        payload: SearchPayload,
        ttl: Duration,
    ) -> PutOutcome {
        let entry = CacheEntry::new(key.to_string(), filters, payload, ttl);

        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(e) => {
                warn!(key, error = %e, "Cache entry could not be serialized, skipping");
                return PutOutcome::Skipped(e.to_string());
            }
        };

        match self.backend.write(&storage_key(key), &serialized) {
            Ok(()) => {
                debug!(key, bytes = serialized.len(), "Cache entry stored");
                PutOutcome::Stored
            }
            Err(e) => {
                warn!(key, error = %e, "Cache write failed, continuing without caching");
                PutOutcome::Skipped(e.to_string())
            }
        }
    }

    // == Get ==
    /// Retrieves a live entry by canonical key.
    ///
    /// Not a pure read: an expired or corrupt entry found here is deleted
    /// before `None` is returned. Use [`CacheStore::peek`] for a side-effect
    /// free check.
    pub fn get(&mut self, key: &str) -> Option<CacheEntry> {
        self.resolve(&storage_key(key), current_timestamp_ms())
    }

    // == Peek ==
    /// Returns a live entry without reaping anything.
    pub fn peek(&self, key: &str) -> Option<CacheEntry> {
        match self.load(&storage_key(key)) {
            Ok(Some(entry)) if !entry.is_expired() => Some(entry),
            _ => None,
        }
    }

    // == Scan Live ==
    /// Lazily yields every live entry.
    ///
    /// The key list is snapshotted when called; each entry is loaded on
    /// demand, and expired or corrupt ones are deleted as they are met. Call
    /// again to restart.
    pub fn scan_live(&mut self) -> LiveEntries<'_> {
        let keys = self.namespaced_keys();
        LiveEntries {
            store: self,
            keys: keys.into_iter(),
            now: current_timestamp_ms(),
        }
    }

    // == Clear ==
    /// Removes every namespaced entry, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let mut removed = 0;
        for key in self.namespaced_keys() {
            match self.backend.remove(&key) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to remove cache entry during clear")
                }
            }
        }
        removed
    }

    // == Stats ==
    /// Summarizes what is physically stored, expired entries included.
    pub fn stats(&self) -> StoreStats {
        let mut stats = StoreStats::default();

        for key in self.namespaced_keys() {
            let Ok(Some(raw)) = self.backend.read(&key) else {
                continue;
            };
            stats.total_entries += 1;
            stats.total_size_bytes += key.len() + raw.len();

            if let Ok(entry) = serde_json::from_str::<CacheEntry>(&raw) {
                stats.record_created(entry.created_at);
            }
        }

        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired and corrupt entries.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let mut removed = 0;

        for key in self.namespaced_keys() {
            let stale = match self.load(&key) {
                Ok(Some(entry)) => entry.is_expired_at(now),
                Ok(None) => false,
                Err(CacheError::StoreCorruption(_)) => true,
                Err(_) => false,
            };
            if stale && matches!(self.backend.remove(&key), Ok(true)) {
                removed += 1;
            }
        }

        removed
    }

    // == Length ==
    /// Returns the number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.namespaced_keys().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Loads and decodes one entry by storage key.
    fn load(&self, storage_key: &str) -> Result<Option<CacheEntry>> {
        let Some(raw) = self.backend.read(storage_key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| CacheError::StoreCorruption(format!("{}: {}", storage_key, e)))
    }

    /// Loads one entry, deleting it if expired or corrupt.
    fn resolve(&mut self, storage_key: &str, now: u64) -> Option<CacheEntry> {
        match self.load(storage_key) {
            Ok(Some(entry)) if entry.is_expired_at(now) => {
                debug!(key = storage_key, "Reaping expired cache entry");
                self.discard(storage_key);
                None
            }
            Ok(entry) => entry,
            Err(CacheError::StoreCorruption(reason)) => {
                warn!(key = storage_key, reason = %reason, "Discarding corrupt cache entry");
                self.discard(storage_key);
                None
            }
            Err(e) => {
                warn!(key = storage_key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    fn discard(&mut self, storage_key: &str) {
        if let Err(e) = self.backend.remove(storage_key) {
            warn!(key = storage_key, error = %e, "Failed to delete cache entry");
        }
    }

    fn namespaced_keys(&self) -> Vec<String> {
        match self.backend.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter(|k| k.starts_with(KEY_PREFIX))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Failed to list cache keys");
                Vec::new()
            }
        }
    }
}

// == Live Entries ==
/// Lazy iterator over live entries, returned by [`CacheStore::scan_live`].
pub struct LiveEntries<'a> {
    store: &'a mut CacheStore,
    keys: vec::IntoIter<String>,
    now: u64,
}

impl Iterator for LiveEntries<'_> {
    type Item = CacheEntry;

    fn next(&mut self) -> Option<CacheEntry> {
        for key in self.keys.by_ref() {
            if let Some(entry) = self.store.resolve(&key, self.now) {
                return Some(entry);
            }
        }
        None
    }
}
