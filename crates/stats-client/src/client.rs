use std::time::Duration;

use reqwest::{Client, Response};
use tracing::debug;

use crate::dto::{EndpointHit, StatsQuery, ViewStats};
use crate::error::{Result, StatsClientError};

/// HTTP client for the statistics service.
#[derive(Debug, Clone)]
pub struct StatsClient {
    base_url: String,
    client: Client,
}

impl StatsClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Record a visit of `hit.uri`.
    pub async fn record_hit(&self, hit: &EndpointHit) -> Result<()> {
        debug!("Recording hit {} from {}", hit.uri, hit.ip);

        let response = self
            .client
            .post(format!("{}/hit", self.base_url))
            .json(hit)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    /// Fetch hit counts per (app, uri), most visited first.
    pub async fn get_stats(&self, query: &StatsQuery) -> Result<Vec<ViewStats>> {
        let response = self
            .client
            .get(format!("{}/stats", self.base_url))
            .query(&query.to_params())
            .send()
            .await?;

        let stats = ensure_success(response).await?.json::<Vec<ViewStats>>().await?;
        Ok(stats)
    }
}

async fn ensure_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(StatsClientError::Status { status, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = StatsClient::new("http://stats:9090/").unwrap();
        assert_eq!(client.base_url(), "http://stats:9090");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        let client = StatsClient::new("http://127.0.0.1:9").unwrap();
        let result = client.record_hit(&EndpointHit::new("app", "/events", "127.0.0.1")).await;
        assert!(matches!(result, Err(StatsClientError::Request(_))));
    }
}
