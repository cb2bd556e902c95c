//! API Module
//!
//! HTTP handlers and routing for the explorer cache REST API.
//!
//! # Endpoints
//! - `POST /search` - Search through the cache
//! - `GET /cache/stats` - Cache statistics
//! - `DELETE /cache` - Clear the cache
//! - `GET /cache/popular` - Popular cached searches
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
