//! Real Query Executor
//!
//! The paid upstream search the cache sits in front of.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::cache::{FilterSet, SearchPayload};

// == Query Executor ==
/// Trait for upstream discovery providers.
///
/// The cache only looks at success or failure and the `{items, count}` shape
/// of the payload.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs one billed search for a single page.
    async fn execute(
        &self,
        filters: &FilterSet,
        page: u32,
        size: u32,
    ) -> anyhow::Result<SearchPayload>;
}

#[derive(Serialize)]
struct UpstreamRequest<'a> {
    filters: &'a FilterSet,
    page: u32,
    size: u32,
}

// == HTTP Executor ==
/// Executor forwarding searches to an HTTP provider endpoint as JSON.
#[derive(Debug, Clone)]
pub struct HttpQueryExecutor {
    client: reqwest::Client,
    url: String,
}

impl HttpQueryExecutor {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building upstream HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl QueryExecutor for HttpQueryExecutor {
    async fn execute(
        &self,
        filters: &FilterSet,
        page: u32,
        size: u32,
    ) -> anyhow::Result<SearchPayload> {
        debug!(url = %self.url, page, size, "Issuing upstream search");

        let payload = self
            .client
            .post(&self.url)
            .json(&UpstreamRequest {
                filters,
                page,
                size,
            })
            .send()
            .await
            .with_context(|| format!("sending search to {}", self.url))?
            .error_for_status()
            .context("upstream rejected search")?
            .json::<SearchPayload>()
            .await
            .context("decoding upstream search response")?;

        Ok(payload)
    }
}
