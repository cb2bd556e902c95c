//! Integration Tests for API Endpoints
//!
//! Tests the full request/response cycle for each endpoint against a mock
//! upstream provider.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use explorer_cache::{
    api::create_router,
    cache::{CacheStore, FileBackend, FilterField, FilterSet, SearchPayload},
    AppState, Config, ExplorerCache, QueryExecutor,
};
use serde_json::{json, Value};
use tower::ServiceExt;

// == Mock Upstream ==

/// Records every query it receives and answers with one row per call.
#[derive(Default)]
struct MockProvider {
    calls: AtomicUsize,
    seen: Mutex<Vec<(FilterSet, u32, u32)>>,
    failing: AtomicBool,
    count: u64,
}

impl MockProvider {
    fn with_count(count: u64) -> Arc<Self> {
        Arc::new(Self {
            count,
            ..Self::default()
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryExecutor for MockProvider {
    async fn execute(
        &self,
        filters: &FilterSet,
        page: u32,
        size: u32,
    ) -> anyhow::Result<SearchPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push((filters.clone(), page, size));

        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("provider returned 429 Too Many Requests");
        }

        let mut payload = SearchPayload::new(
            vec![json!({ "handle": format!("creator_{}", page), "page": page })],
            self.count,
        );
        payload.usage = Some(json!({ "credits_used": 1 }));
        Ok(payload)
    }
}

// == Helper Functions ==

fn test_config(prefetch_pages: u32) -> Config {
    Config {
        prefetch_pages,
        ..Config::default()
    }
}

fn create_test_app(provider: Arc<MockProvider>, prefetch_pages: u32) -> (Router, AppState) {
    let cache = ExplorerCache::new(CacheStore::in_memory(), Duration::from_secs(300));
    let state = AppState::with_executor(cache, provider, &test_config(prefetch_pages));
    (create_router(state.clone()), state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn post_search(app: &Router, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/search")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

fn broad_instagram() -> Value {
    json!({
        "filters": {"platform": "instagram", "minFollowers": 50000, "maxFollowers": 500000},
        "page": 1,
        "size": 20
    })
}

// == Search Endpoint Tests ==

#[tokio::test]
async fn test_search_miss_then_exact_hit() {
    let provider = MockProvider::with_count(5);
    let (app, _) = create_test_app(provider.clone(), 0);

    let (status, first) = post_search(&app, broad_instagram()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert_eq!(first["items"][0]["handle"], "creator_1");
    assert_eq!(first["cache_info"]["usage"]["credits_used"], 1);

    let (status, second) = post_search(&app, broad_instagram()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["cached"], true);
    assert_eq!(second["cache_info"]["compatible_match"], false);
    assert_eq!(second["items"], first["items"]);

    assert_eq!(provider.calls(), 1, "Exact hit must not reach the provider");
}

#[tokio::test]
async fn test_narrower_search_served_by_broader_entry() {
    let provider = MockProvider::with_count(5);
    let (app, _) = create_test_app(provider.clone(), 0);

    let (_, broad) = post_search(&app, broad_instagram()).await;

    let narrow = json!({
        "filters": {"platform": "instagram", "minFollowers": 100000, "maxFollowers": 300000},
        "page": 1,
        "size": 20
    });
    let (status, body) = post_search(&app, narrow).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], true);
    assert_eq!(body["cache_info"]["compatible_match"], true);
    assert!(body["cache_info"]["score"].as_u64().unwrap() > 0);
    assert_eq!(body["items"], broad["items"]);
    assert_eq!(provider.calls(), 1, "Compatible hit must not reach the provider");
}

#[tokio::test]
async fn test_other_platform_misses() {
    let provider = MockProvider::with_count(5);
    let (app, _) = create_test_app(provider.clone(), 0);

    post_search(&app, broad_instagram()).await;

    let tiktok = json!({
        "filters": {"platform": "tiktok", "minFollowers": 50000},
        "page": 1,
        "size": 20
    });
    let (status, body) = post_search(&app, tiktok).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cached"], false);
    assert_eq!(provider.calls(), 2);

    let seen = provider.seen.lock().unwrap();
    let (filters, page, size) = &seen[1];
    assert_eq!(
        filters,
        &FilterSet::new()
            .with(FilterField::Platform, "tiktok")
            .with(FilterField::MinFollowers, 50_000)
    );
    assert_eq!((*page, *size), (1, 20));
}

#[tokio::test]
async fn test_different_page_is_separate_entry() {
    let provider = MockProvider::with_count(100);
    let (app, _) = create_test_app(provider.clone(), 0);

    post_search(&app, broad_instagram()).await;

    let mut page_two = broad_instagram();
    page_two["page"] = json!(2);
    let (_, body) = post_search(&app, page_two).await;

    assert_eq!(body["cached"], false);
    assert_eq!(body["items"][0]["page"], 2);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_search_defaults_page_and_size() {
    let provider = MockProvider::with_count(0);
    let (app, _) = create_test_app(provider.clone(), 0);

    let (status, body) = post_search(&app, json!({"filters": {"country": "US"}})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["size"], 20);
    assert_eq!(provider.seen.lock().unwrap()[0].1, 1);
}

#[tokio::test]
async fn test_search_invalid_page() {
    let provider = MockProvider::with_count(0);
    let (app, _) = create_test_app(provider.clone(), 0);

    let (status, body) = post_search(&app, json!({"filters": {}, "page": 0})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("error").is_some());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_search_oversized_page() {
    let provider = MockProvider::with_count(0);
    let (app, _) = create_test_app(provider, 0);

    let (status, _) = post_search(&app, json!({"filters": {}, "size": 10_000})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_unknown_filter_rejected() {
    let provider = MockProvider::with_count(0);
    let (app, _) = create_test_app(provider.clone(), 0);

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/search")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"filters":{"shoeSize":42}}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_search_upstream_failure() {
    let provider = MockProvider::with_count(5);
    provider.failing.store(true, Ordering::SeqCst);
    let (app, state) = create_test_app(provider.clone(), 0);

    let (status, body) = post_search(&app, broad_instagram()).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("429"));
    assert_eq!(
        state.search.cache().store_stats().await.total_entries,
        0,
        "Failed queries must not be cached"
    );
}

#[tokio::test]
async fn test_text_range_value_bypasses_cache() {
    let provider = MockProvider::with_count(5);
    let (app, state) = create_test_app(provider.clone(), 0);

    let body = json!({"filters": {"minFollowers": "lots"}});
    let (status, first) = post_search(&app, body.clone()).await;
    let (_, second) = post_search(&app, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["cached"], false);
    assert_eq!(second["cached"], false);
    assert_eq!(provider.calls(), 2);
    assert_eq!(state.search.cache().store_stats().await.total_entries, 0);
}

// == Prefetch Tests ==

#[tokio::test]
async fn test_prefetch_warms_following_pages() {
    let provider = MockProvider::with_count(100);
    let (app, state) = create_test_app(provider.clone(), 2);

    post_search(&app, broad_instagram()).await;
    state.search.prefetcher().drain().await;

    assert_eq!(provider.calls(), 3, "Page 1 plus two prefetched pages");

    let mut page_two = broad_instagram();
    page_two["page"] = json!(2);
    let (_, body) = post_search(&app, page_two).await;
    assert_eq!(body["cached"], true);
    assert_eq!(body["items"][0]["page"], 2);
}

#[tokio::test]
async fn test_prefetch_stops_at_last_page() {
    let provider = MockProvider::with_count(5);
    let (app, state) = create_test_app(provider.clone(), 2);

    post_search(&app, broad_instagram()).await;
    state.search.prefetcher().drain().await;

    assert_eq!(provider.calls(), 1, "A single page of results has nothing to prefetch");
}

// == Stats / Clear / Popular Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let provider = MockProvider::with_count(5);
    let (app, _) = create_test_app(provider, 0);

    post_search(&app, broad_instagram()).await;
    post_search(&app, broad_instagram()).await;

    let (status, stats) = get_json(&app, "/cache/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total_entries"], 1);
    assert!(stats["total_size_bytes"].as_u64().unwrap() > 0);
    assert_eq!(stats["exact_hits"], 1);
    assert_eq!(stats["misses"], 1);
    assert_eq!(stats["hit_rate"], 0.5);
    assert!(stats["newest_entry"].is_string());
    assert!(stats.get("prefetch").is_some());
}

#[tokio::test]
async fn test_clear_endpoint() {
    let provider = MockProvider::with_count(5);
    let (app, _) = create_test_app(provider.clone(), 0);

    post_search(&app, broad_instagram()).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/cache")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_to_json(response.into_body()).await;
    assert_eq!(body["removed"], 1);

    let (_, after) = post_search(&app, broad_instagram()).await;
    assert_eq!(after["cached"], false);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_popular_endpoint() {
    let provider = MockProvider::with_count(100);
    let (app, _) = create_test_app(provider, 0);

    for page in 1..=3 {
        let mut body = broad_instagram();
        body["page"] = json!(page);
        post_search(&app, body).await;
    }
    post_search(&app, json!({"filters": {"platform": "youtube"}})).await;

    let (status, body) = get_json(&app, "/cache/popular?limit=1").await;

    assert_eq!(status, StatusCode::OK);
    let searches = body["searches"].as_array().unwrap();
    assert_eq!(searches.len(), 1);
    assert_eq!(searches[0]["cached_pages"], 3);
    assert_eq!(searches[0]["filters"]["platform"], "instagram");
    assert!(searches[0]["filters"].get("page").is_none());
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = create_test_app(MockProvider::with_count(0), 0);

    let (status, body) = get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body.get("timestamp").is_some());
}

#[tokio::test]
async fn test_nonexistent_endpoint() {
    let (app, _) = create_test_app(MockProvider::with_count(0), 0);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Persistence Tests ==

#[tokio::test]
async fn test_file_backend_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let provider = MockProvider::with_count(5);

    {
        let store = tokio_test::assert_ok!(FileBackend::open(dir.path()));
        let cache = ExplorerCache::new(CacheStore::new(store), Duration::from_secs(300));
        let state = AppState::with_executor(cache, provider.clone(), &test_config(0));
        post_search(&create_router(state), broad_instagram()).await;
    }

    let store = tokio_test::assert_ok!(FileBackend::open(dir.path()));
    let cache = ExplorerCache::new(CacheStore::new(store), Duration::from_secs(300));
    let state = AppState::with_executor(cache, provider.clone(), &test_config(0));
    let (_, body) = post_search(&create_router(state), broad_instagram()).await;

    assert_eq!(body["cached"], true);
    assert_eq!(provider.calls(), 1);
}
