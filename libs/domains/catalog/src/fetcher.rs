use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::error::FeedError;

/// Retrieves the raw feed document behind a URL
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FeedError>;
}

/// HTTP feed fetcher backed by reqwest
#[derive(Clone)]
pub struct HttpFeedFetcher {
    client: reqwest::Client,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("retail-api/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FeedError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Feed request failed");
            FeedError::Fetch(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = %status, "Feed server returned an error status");
            return Err(FeedError::Fetch(format!("{} returned {}", url, status)));
        }

        response
            .text()
            .await
            .map_err(|e| FeedError::Fetch(format!("failed to read body: {}", e)))
    }
}

/// Serves registered documents by URL; anything else is a fetch failure.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFeedFetcher {
    documents: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryFeedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, url: impl Into<String>, document: impl Into<String>) {
        self.documents
            .write()
            .await
            .insert(url.into(), document.into());
    }
}

#[async_trait]
impl FeedFetcher for InMemoryFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FeedError> {
        self.documents
            .read()
            .await
            .get(url)
            .cloned()
            .ok_or_else(|| FeedError::Fetch(format!("{} returned 404 Not Found", url)))
    }
}
