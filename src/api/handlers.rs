//! API Handlers
//!
//! HTTP request handlers for each explorer cache endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::cache::{CacheStore, FileBackend, MemoryBackend};
use crate::config::{BackendKind, Config};
use crate::error::{CacheError, Result};
use crate::explorer::{ExplorerCache, HttpQueryExecutor, QueryExecutor, SearchService};
use crate::models::{
    ClearResponse, HealthResponse, PopularQuery, PopularResponse, SearchRequest, SearchResponse,
    StatsResponse,
};

/// Popular searches returned when no limit is given.
const DEFAULT_POPULAR_LIMIT: usize = 10;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Search path: cache, upstream executor, prefetcher
    pub search: SearchService,
    /// Page size applied when a request omits one
    pub default_page_size: u32,
}

impl AppState {
    /// Creates a new AppState around a search service.
    pub fn new(search: SearchService, default_page_size: u32) -> Self {
        Self {
            search,
            default_page_size,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the configured storage backend and the HTTP upstream executor.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = match config.backend {
            BackendKind::Memory => {
                CacheStore::new(MemoryBackend::with_quota(config.memory_quota()))
            }
            BackendKind::File => CacheStore::new(FileBackend::open(&config.cache_dir)?),
        };
        let cache = ExplorerCache::new(store, Duration::from_secs(config.cache_ttl));

        let executor = HttpQueryExecutor::new(
            config.upstream_url.clone(),
            Duration::from_secs(config.upstream_timeout),
        )
        .map_err(|e| CacheError::Internal(format!("{:#}", e)))?;

        Ok(Self::with_executor(cache, Arc::new(executor), config))
    }

    /// Creates a new AppState with a caller-supplied upstream executor.
    pub fn with_executor(
        cache: ExplorerCache,
        executor: Arc<dyn QueryExecutor>,
        config: &Config,
    ) -> Self {
        let search = SearchService::new(cache, executor, config.prefetch_pages);
        Self::new(search, config.default_page_size)
    }
}

/// Handler for POST /search
///
/// Answers one page of a search, from cache when possible.
pub async fn search_handler(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let page = req.page.unwrap_or(1);
    let size = req.size.unwrap_or(state.default_page_size);
    let response = state.search.search(&req.filters, page, size).await?;

    Ok(Json(response))
}

/// Handler for GET /cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.search.cache();
    let store = cache.store_stats().await;

    Json(StatsResponse::new(
        store,
        cache.lookup_stats(),
        state.search.prefetcher().stats(),
    ))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse::new(state.search.clear().await))
}

/// Handler for GET /cache/popular
pub async fn popular_handler(
    State(state): State<AppState>,
    Query(query): Query<PopularQuery>,
) -> Json<PopularResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_POPULAR_LIMIT);
    Json(PopularResponse {
        searches: state.search.popular_searches(limit).await,
    })
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
