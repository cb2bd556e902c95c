//! Search Service
//!
//! The inbound search path: cache lookup, real query on miss, store, prefetch.
//! The cache is never the reason a search fails; only upstream errors reach
//! the caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{canonicalize, millis_to_utc, FilterSet, SearchPayload};
use crate::error::{CacheError, Result};
use crate::explorer::{ExplorerCache, LookupOutcome, Prefetcher, QueryExecutor};
use crate::models::SearchResponse;

// == Popular Search ==
/// A logical query (pagination stripped) and how much of it is cached.
#[derive(Debug, Clone, Serialize)]
pub struct PopularSearch {
    pub filters: FilterSet,
    pub cached_pages: usize,
    pub last_cached: Option<DateTime<Utc>>,
}

// == Search Service ==
#[derive(Clone)]
pub struct SearchService {
    cache: ExplorerCache,
    executor: Arc<dyn QueryExecutor>,
    prefetcher: Prefetcher,
    prefetch_pages: u32,
}

impl SearchService {
    pub fn new(
        cache: ExplorerCache,
        executor: Arc<dyn QueryExecutor>,
        prefetch_pages: u32,
    ) -> Self {
        let prefetcher = Prefetcher::new(cache.clone(), executor.clone());
        Self {
            cache,
            executor,
            prefetcher,
            prefetch_pages,
        }
    }

    pub fn cache(&self) -> &ExplorerCache {
        &self.cache
    }

    pub fn prefetcher(&self) -> &Prefetcher {
        &self.prefetcher
    }

    // == Search ==
    /// Answers one page of a search, from cache when possible.
    ///
    /// # Errors
    /// `CacheError::RealQuery` when the upstream query fails; nothing is
    /// cached in that case.
    pub async fn search(
        &self,
        filters: &FilterSet,
        page: u32,
        size: u32,
    ) -> Result<SearchResponse> {
        let query = filters.without_pagination();
        let executed = query.with_page(page, size);

        let cacheable = match self.cache.lookup(&executed).await {
            Ok(LookupOutcome::ExactHit(entry)) => {
                self.prefetch_after(&query, &entry.payload, page, size);
                return Ok(SearchResponse::from_cache(entry, None, page, size));
            }
            Ok(LookupOutcome::CompatibleHit { entry, score }) => {
                self.prefetch_after(&query, &entry.payload, page, size);
                return Ok(SearchResponse::from_cache(entry, Some(score), page, size));
            }
            Ok(LookupOutcome::Miss { .. }) => true,
            Err(e) => {
                warn!(error = %e, "Search filters not cacheable, querying upstream directly");
                false
            }
        };

        let payload = self
            .executor
            .execute(&query, page, size)
            .await
            .map_err(CacheError::RealQuery)?;

        if cacheable {
            if let Err(e) = self.cache.store(&executed, payload.clone()).await {
                warn!(error = %e, "Search result not cached");
            }
            self.prefetch_after(&query, &payload, page, size);
        }

        Ok(SearchResponse::fresh(payload, page, size))
    }

    /// Schedules the following pages that exist according to `count`.
    fn prefetch_after(&self, query: &FilterSet, payload: &SearchPayload, page: u32, size: u32) {
        let ahead = self.prefetch_pages.min(pages_remaining(payload.count, page, size));
        if ahead > 0 {
            self.prefetcher.schedule_prefetch(query, size, page, ahead);
        }
    }

    // == Popular Searches ==
    /// Logical queries with the most cached pages, most recent first on ties.
    pub async fn popular_searches(&self, limit: usize) -> Vec<PopularSearch> {
        let mut groups: HashMap<String, (FilterSet, usize, u64)> = HashMap::new();

        for entry in self.cache.live_entries().await {
            let query = entry.filters.without_pagination();
            let Ok(key) = canonicalize(&query) else {
                continue;
            };
            let group = groups.entry(key).or_insert((query, 0, 0));
            group.1 += 1;
            group.2 = group.2.max(entry.created_at);
        }

        let mut popular: Vec<_> = groups.into_values().collect();
        popular.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)));

        popular
            .into_iter()
            .take(limit)
            .map(|(filters, cached_pages, last)| PopularSearch {
                filters,
                cached_pages,
                last_cached: millis_to_utc(last),
            })
            .collect()
    }

    // == Clear ==
    /// Clears the cache.
    pub async fn clear(&self) -> usize {
        let removed = self.cache.clear().await;
        info!(removed, "Explorer cache cleared");
        removed
    }
}

/// Pages after `page` that still hold results.
fn pages_remaining(count: u64, page: u32, size: u32) -> u32 {
    if size == 0 {
        return 0;
    }
    let total_pages = count.div_ceil(u64::from(size));
    u32::try_from(total_pages.saturating_sub(u64::from(page))).unwrap_or(u32::MAX)
}
