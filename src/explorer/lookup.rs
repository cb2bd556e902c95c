//! Cache Lookup Orchestrator
//!
//! Resolves a search against the store: exact canonical key first, then the
//! best-scoring compatible entry, else a miss the caller must fill with a real
//! query.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{
    canonicalize, evaluate, CacheEntry, CacheStore, FilterSet, LookupStats, PutOutcome,
    SearchPayload, StoreStats,
};
use crate::error::Result;

// == Lookup Outcome ==
/// Terminal state of a lookup.
#[derive(Debug, Clone)]
pub enum LookupOutcome {
    /// Entry stored under the requested canonical key
    ExactHit(CacheEntry),
    /// Broader live entry whose result set contains the requested one
    CompatibleHit { entry: CacheEntry, score: u32 },
    /// Nothing usable; `key` is the canonical key to store under
    Miss { key: String },
}

impl LookupOutcome {
    pub fn is_hit(&self) -> bool {
        !matches!(self, LookupOutcome::Miss { .. })
    }

    pub fn entry(&self) -> Option<&CacheEntry> {
        match self {
            LookupOutcome::ExactHit(entry) | LookupOutcome::CompatibleHit { entry, .. } => {
                Some(entry)
            }
            LookupOutcome::Miss { .. } => None,
        }
    }
}

// == Explorer Cache ==
/// Shared handle over the cache store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ExplorerCache {
    /// Store behind a write-capable lock: reads may reap
    store: Arc<RwLock<CacheStore>>,
    stats: Arc<Mutex<LookupStats>>,
    ttl: Duration,
}

impl ExplorerCache {
    /// Creates a cache owning `store`, writing entries with `ttl`.
    pub fn new(store: CacheStore, ttl: Duration) -> Self {
        Self::from_shared(Arc::new(RwLock::new(store)), ttl)
    }

    /// Creates a cache over an already shared store.
    pub fn from_shared(store: Arc<RwLock<CacheStore>>, ttl: Duration) -> Self {
        Self {
            store,
            stats: Arc::new(Mutex::new(LookupStats::new())),
            ttl,
        }
    }

    /// Shared store handle, for the expiry sweep task.
    pub fn store_handle(&self) -> Arc<RwLock<CacheStore>> {
        self.store.clone()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Lookup ==
    /// Finds a cached answer for `filters`.
    ///
    /// # Errors
    /// Only `CacheError::Encoding` for filters that cannot be canonicalized.
    /// Store failures while scanning skip the offending entry.
    pub async fn lookup(&self, filters: &FilterSet) -> Result<LookupOutcome> {
        let key = canonicalize(filters)?;
        let mut store = self.store.write().await;

        if let Some(entry) = store.get(&key) {
            debug!(key = %key, "Exact cache hit");
            self.update_stats(LookupStats::record_exact_hit);
            return Ok(LookupOutcome::ExactHit(entry));
        }

        let best = store
            .scan_live()
            .filter_map(|entry| {
                let result = evaluate(filters, &entry.filters);
                result.is_compatible.then_some((result.score, entry))
            })
            .max_by_key(|(score, entry)| (*score, entry.created_at));

        match best {
            Some((score, entry)) => {
                debug!(key = %key, matched = %entry.key, score, "Compatible cache hit");
                self.update_stats(LookupStats::record_compatible_hit);
                Ok(LookupOutcome::CompatibleHit { entry, score })
            }
            None => {
                debug!(key = %key, "Cache miss");
                self.update_stats(LookupStats::record_miss);
                Ok(LookupOutcome::Miss { key })
            }
        }
    }

    // == Lookup Exact ==
    /// Exact-key check only, without touching the hit counters.
    pub async fn lookup_exact(&self, filters: &FilterSet) -> Result<Option<CacheEntry>> {
        let key = canonicalize(filters)?;
        Ok(self.store.write().await.get(&key))
    }

    // == Store ==
    /// Caches the result of a successful real query for `filters`.
    pub async fn store(&self, filters: &FilterSet, payload: SearchPayload) -> Result<PutOutcome> {
        let key = canonicalize(filters)?;
        let outcome = self
            .store
            .write()
            .await
            .put(&key, filters.clone(), payload, self.ttl);

        if !outcome.is_stored() {
            self.update_stats(LookupStats::record_skipped_write);
        }
        Ok(outcome)
    }

    // == Residency ==
    /// Whether a live entry sits under canonical `key`, without reaping.
    ///
    /// Never waits: reports `false` while a writer holds the store.
    pub fn is_resident(&self, key: &str) -> bool {
        self.store
            .try_read()
            .map(|store| store.peek(key).is_some())
            .unwrap_or(false)
    }

    // == Clear ==
    /// Removes every entry.
    pub async fn clear(&self) -> usize {
        self.store.write().await.clear()
    }

    /// Every live entry, reaping expired ones on the way.
    pub async fn live_entries(&self) -> Vec<CacheEntry> {
        self.store.write().await.scan_live().collect()
    }

    // == Stats ==
    pub async fn store_stats(&self) -> StoreStats {
        self.store.read().await.stats()
    }

    pub fn lookup_stats(&self) -> LookupStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_stats(&self, record: impl FnOnce(&mut LookupStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        record(&mut stats);
    }
}
