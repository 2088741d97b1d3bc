//! Sources of [`PerformancePayload`]s.

use anyhow::Result;

use crate::payload::PerformancePayload;

mod file;
#[cfg(feature = "http")]
mod http;
mod memory;

pub use file::JsonFileProvider;
#[cfg(feature = "http")]
pub use http::HttpSeriesProvider;
pub use memory::MemorySeriesProvider;

/// Loads a validated performance payload.
#[async_trait::async_trait]
pub trait SeriesProvider: Send + Sync {
    async fn load(&self) -> Result<PerformancePayload>;

    /// Short label for logs.
    fn name(&self) -> &str;
}
