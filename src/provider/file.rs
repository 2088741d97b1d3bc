use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::SeriesProvider;
use crate::payload::PerformancePayload;

/// Reads a payload saved as JSON, e.g. by `wealthwise reconstruct`.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl SeriesProvider for JsonFileProvider {
    async fn load(&self) -> Result<PerformancePayload> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read payload file: {}", self.path.display()))?;
        let payload = PerformancePayload::from_json_str(&content)
            .with_context(|| format!("Failed to load payload file: {}", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            points = payload.portfolio.len(),
            "loaded performance payload"
        );
        Ok(payload)
    }

    fn name(&self) -> &str {
        "file"
    }
}
