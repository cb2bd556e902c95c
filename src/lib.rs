//! Explorer Cache - search result caching for metered discovery APIs
//!
//! Caches provider search results keyed by their filters, answers narrower
//! searches from broader cached ones, and prefetches following pages.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod explorer;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use explorer::{ExplorerCache, Prefetcher, QueryExecutor, SearchService};
pub use tasks::spawn_cleanup_task;
