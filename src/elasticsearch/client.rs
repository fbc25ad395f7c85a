//! Elasticsearch client wrapper.

use std::time::Duration;

use anyhow::Result;
use elasticsearch::{
    cluster::ClusterHealthParts,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    Elasticsearch, SearchParts,
};
use serde_json::Value;
use url::Url;

use crate::error::ApiError;

/// How long to wait for an engine response. This bounds the caller's wait
/// only; a query the engine already accepted keeps running server-side.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Elasticsearch client wrapper with connection configuration
#[derive(Clone)]
pub struct EsClient {
    client: Elasticsearch,
    pub index_name: String,
}

impl EsClient {
    /// Create a new Elasticsearch client
    pub async fn new(es_url: &str, index_name: &str) -> Result<Self> {
        let url = Url::parse(es_url)?;
        let conn_pool = SingleNodeConnectionPool::new(url);
        let transport = TransportBuilder::new(conn_pool).disable_proxy().build()?;

        let client = Elasticsearch::new(transport);

        Ok(Self {
            client,
            index_name: index_name.to_string(),
        })
    }

    /// Execute a search body against the configured index.
    ///
    /// Non-success engine responses are surfaced as errors with the body
    /// attached, so the caller can log the detail without echoing it.
    pub async fn search(&self, body: Value) -> Result<Value, ApiError> {
        let response = self
            .client
            .search(SearchParts::Index(&[&self.index_name]))
            .body(body)
            .request_timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status_code().is_success() {
            let status = response.status_code();
            let detail = response.text().await.unwrap_or_default();
            return Err(ApiError::EngineResponse(format!(
                "search returned {}: {}",
                status, detail
            )));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Cluster health for the configured index.
    pub async fn cluster_health(&self) -> Result<Value, ApiError> {
        let response = self
            .client
            .cluster()
            .health(ClusterHealthParts::Index(&[&self.index_name]))
            .request_timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        Ok(response.json::<Value>().await?)
    }
}
