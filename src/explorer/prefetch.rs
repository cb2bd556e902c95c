//! Page Prefetcher
//!
//! Warms the cache with the pages that follow the one just served, so paging
//! through results does not trigger new billed queries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{canonicalize, FilterSet};
use crate::explorer::{ExplorerCache, QueryExecutor};

// == Prefetch Stats ==
/// Prefetch counters.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct PrefetchStats {
    /// Real queries issued by prefetch tasks
    pub issued: u64,
    /// Prefetch queries that failed
    pub failed: u64,
    /// Pages currently being fetched
    pub in_flight: usize,
}

// == Prefetcher ==
/// Fire-and-forget page warmer.
///
/// At most one task runs per canonical key: the in-flight map is checked and
/// updated under a single lock acquisition.
#[derive(Clone)]
pub struct Prefetcher {
    cache: ExplorerCache,
    executor: Arc<dyn QueryExecutor>,
    in_flight: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    issued: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
}

impl Prefetcher {
    pub fn new(cache: ExplorerCache, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            cache,
            executor,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            issued: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
        }
    }

    // == Schedule Prefetch ==
    /// Schedules background fetches of pages
    /// `current_page + 1 ..= current_page + pages_ahead` of the query `filters`.
    ///
    /// Returns the pages a new task was spawned for. Pages already cached or
    /// already in flight are skipped, as are pages past `u32::MAX`. Each task
    /// checks residency again before querying. Failures are logged and
    /// dropped.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn schedule_prefetch(
        &self,
        filters: &FilterSet,
        size: u32,
        current_page: u32,
        pages_ahead: u32,
    ) -> Vec<u32> {
        let logical = filters.without_pagination();
        let pages = (1..=pages_ahead).map_while(|ahead| current_page.checked_add(ahead));

        let mut scheduled = Vec::new();
        let mut in_flight = self.lock_in_flight();
        in_flight.retain(|_, handle| !handle.is_finished());

        for page in pages {
            let paged = logical.with_page(page, size);
            let key = match canonicalize(&paged) {
                Ok(key) => key,
                Err(e) => {
                    warn!(error = %e, "Cannot prefetch unencodable filters");
                    break;
                }
            };

            if in_flight.contains_key(&key) {
                debug!(page, "Prefetch already in flight");
                continue;
            }
            if self.cache.is_resident(&key) {
                debug!(page, "Page already cached");
                continue;
            }

            let task = self.clone().prefetch_page(key.clone(), paged, page, size);
            in_flight.insert(key, tokio::spawn(task));
            scheduled.push(page);
        }

        if !scheduled.is_empty() {
            debug!(pages = ?scheduled, "Prefetch scheduled");
        }
        scheduled
    }

    async fn prefetch_page(self, key: String, filters: FilterSet, page: u32, size: u32) {
        match self.cache.lookup_exact(&filters).await {
            Ok(Some(_)) => debug!(page, "Page already cached"),
            Ok(None) => {
                self.issued.fetch_add(1, Ordering::Relaxed);
                let query = filters.without_pagination();
                match self.executor.execute(&query, page, size).await {
                    Ok(payload) => {
                        if let Err(e) = self.cache.store(&filters, payload).await {
                            warn!(page, error = %e, "Prefetched page could not be stored");
                        } else {
                            debug!(page, "Prefetched page stored");
                        }
                    }
                    Err(e) => {
                        self.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(page, error = %e, "Prefetch query failed");
                    }
                }
            }
            Err(e) => warn!(page, error = %e, "Prefetch lookup failed"),
        }

        self.lock_in_flight().remove(&key);
    }

    // == Drain ==
    /// Waits for every task in flight to finish.
    pub async fn drain(&self) {
        let handles: Vec<JoinHandle<()>> = self
            .lock_in_flight()
            .drain()
            .map(|(_, handle)| handle)
            .collect();

        if !handles.is_empty() {
            info!(tasks = handles.len(), "Waiting for prefetch tasks");
        }
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Prefetch task aborted");
            }
        }
    }

    /// Number of pages currently being fetched.
    pub fn in_flight(&self) -> usize {
        self.lock_in_flight()
            .values()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    pub fn stats(&self) -> PrefetchStats {
        PrefetchStats {
            issued: self.issued.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            in_flight: self.in_flight(),
        }
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
