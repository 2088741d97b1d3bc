use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::SeriesProvider;
use crate::config::BackendConfig;
use crate::payload::PerformancePayload;

/// Fetches the payload from the backend's performance endpoint.
#[derive(Debug, Clone)]
pub struct HttpSeriesProvider {
    client: Client,
    base_url: String,
    path: String,
}

impl HttpSeriesProvider {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &BackendConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            path: config.performance_path.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(self)
    }

    pub fn url(&self) -> String {
        BackendConfig {
            base_url: self.base_url.clone(),
            performance_path: self.path.clone(),
            ..Default::default()
        }
        .performance_url()
    }
}

#[async_trait::async_trait]
impl SeriesProvider for HttpSeriesProvider {
    async fn load(&self) -> Result<PerformancePayload> {
        let url = self.url();
        tracing::debug!(url = %url, "requesting performance payload");

        let body = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("Backend rejected request to {url}"))?
            .text()
            .await
            .context("Failed to read backend response")?;

        let payload = PerformancePayload::from_json_str(&body)
            .with_context(|| format!("Backend returned an invalid payload from {url}"))?;
        Ok(payload)
    }

    fn name(&self) -> &str {
        "http"
    }
}
