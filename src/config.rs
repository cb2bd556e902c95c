//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Default entry lifetime: 14 days.
pub const DEFAULT_TTL_SECS: u64 = 14 * 24 * 60 * 60;

/// Which storage backend holds cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Process-local map with an optional byte quota
    Memory,
    /// One JSON file per entry under `cache_dir`
    File,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "file" | "disk" => Ok(BackendKind::File),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Entry TTL in seconds
    pub cache_ttl: u64,
    /// Background expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Storage backend selection
    pub backend: BackendKind,
    /// Directory used by the file backend
    pub cache_dir: PathBuf,
    /// Byte quota for the memory backend, 0 = unlimited
    pub max_cache_bytes: usize,
    /// Number of pages warmed after each search
    pub prefetch_pages: u32,
    /// Page size used when a request does not carry one
    pub default_page_size: u32,
    /// Upstream provider search endpoint
    pub upstream_url: String,
    /// Upstream request timeout in seconds
    pub upstream_timeout: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL_SECS` - Entry TTL in seconds (default: 14 days)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 3600)
    /// - `CACHE_BACKEND` - `memory` or `file` (default: memory)
    /// - `CACHE_DIR` - File backend directory (default: ./explorer-cache)
    /// - `MAX_CACHE_BYTES` - Memory backend quota (default: 5 MiB)
    /// - `PREFETCH_PAGES` - Pages warmed ahead (default: 2)
    /// - `DEFAULT_PAGE_SIZE` - Page size fallback (default: 20)
    /// - `UPSTREAM_URL` - Provider search endpoint
    /// - `UPSTREAM_TIMEOUT` - Provider timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cache_ttl: env_or("CACHE_TTL_SECS", defaults.cache_ttl),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            backend: env_or("CACHE_BACKEND", defaults.backend),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            max_cache_bytes: env_or("MAX_CACHE_BYTES", defaults.max_cache_bytes),
            prefetch_pages: env_or("PREFETCH_PAGES", defaults.prefetch_pages),
            default_page_size: env_or("DEFAULT_PAGE_SIZE", defaults.default_page_size),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            upstream_timeout: env_or("UPSTREAM_TIMEOUT", defaults.upstream_timeout),
        }
    }

    /// Memory quota as an Option, `None` meaning unlimited.
    pub fn memory_quota(&self) -> Option<usize> {
        (self.max_cache_bytes > 0).then_some(self.max_cache_bytes)
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_ttl: DEFAULT_TTL_SECS,
            cleanup_interval: 3600,
            backend: BackendKind::Memory,
            cache_dir: PathBuf::from("./explorer-cache"),
            max_cache_bytes: 5 * 1024 * 1024,
            prefetch_pages: 2,
            default_page_size: 20,
            upstream_url: "http://127.0.0.1:8080/search".to_string(),
            upstream_timeout: 30,
        }
    }
}
