use anyhow::Result;

use super::SeriesProvider;
use crate::payload::PerformancePayload;

/// Serves a payload already in memory.
#[derive(Debug, Clone)]
pub struct MemorySeriesProvider {
    payload: PerformancePayload,
}

impl MemorySeriesProvider {
    pub fn new(payload: PerformancePayload) -> Self {
        Self { payload }
    }
}

#[async_trait::async_trait]
impl SeriesProvider for MemorySeriesProvider {
    async fn load(&self) -> Result<PerformancePayload> {
        self.payload.validate()?;
        Ok(self.payload.clone())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PricePoint;
    use chrono::NaiveDate;

    fn payload() -> PerformancePayload {
        let d = |day| NaiveDate::from_ymd_opt(2025, 1, day).unwrap();
        PerformancePayload {
            start_date: d(1),
            end_date: d(3),
            symbols: Vec::new(),
            benchmarks: vec!["SPY".to_string()],
            portfolio: Vec::new(),
            benchmark_series: [(
                "SPY".to_string(),
                vec![PricePoint::new(d(3), 1.0), PricePoint::new(d(2), 1.0)],
            )]
            .into_iter()
            .collect(),
            price_series: Default::default(),
            positions: Vec::new(),
            holdings: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn memory_provider_validates() {
        let provider = MemorySeriesProvider::new(payload());
        let err = provider.load().await.unwrap_err();
        assert!(err.to_string().contains("benchmark:SPY"));
    }
}
