use crate::adapters::parse_collection;
use crate::core::recommender::{CENTERS_COLLECTION, RULES_COLLECTION};
use crate::domain::ports::RecordSource;
use crate::utils::error::{FinderError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Fetches each collection with `GET <endpoint>/<collection>`.
#[derive(Debug, Clone)]
pub struct HttpSource {
    endpoint: String,
    centers_collection: String,
    rules_collection: String,
    client: Client,
}

impl HttpSource {
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            centers_collection: CENTERS_COLLECTION.to_string(),
            rules_collection: RULES_COLLECTION.to_string(),
            client,
        })
    }

    pub fn with_collections(mut self, centers: &str, rules: &str) -> Self {
        self.centers_collection = centers.to_string();
        self.rules_collection = rules.to_string();
        self
    }

    async fn read_collection(&self, collection: &str) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}/{}", self.endpoint, collection);
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FinderError::store_unavailable(&self.name(), e.to_string()))?;

        tracing::debug!("API response status: {}", response.status());
        if !response.status().is_success() {
            return Err(FinderError::store_unavailable(
                &self.name(),
                format!("GET {} returned {}", url, response.status()),
            ));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| {
            FinderError::store_unavailable(&self.name(), format!("invalid JSON from {}: {}", url, e))
        })?;

        parse_collection(&self.name(), collection, payload)
    }
}

#[async_trait]
impl RecordSource for HttpSource {
    fn name(&self) -> String {
        format!("http:{}", self.endpoint)
    }

    async fn fetch_centers(&self) -> Result<Vec<serde_json::Value>> {
        self.read_collection(&self.centers_collection).await
    }

    async fn fetch_rules(&self) -> Result<Vec<serde_json::Value>> {
        self.read_collection(&self.rules_collection).await
    }
}
