//! Request and Response models for the explorer cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{PopularQuery, SearchRequest};
pub use responses::{
    CacheInfo, ClearResponse, ErrorResponse, HealthResponse, PopularResponse, SearchResponse,
    StatsResponse,
};
