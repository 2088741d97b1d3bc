use serde::{Deserialize, Serialize};

/// Return and risk statistics for one windowed series.
///
/// `None` means "not computable from this data", which is different from
/// zero. Fields serialize as `null` rather than being omitted so consumers
/// see every key.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub total_return: Option<f64>,
    pub total_abs: Option<f64>,
    pub annualized: Option<f64>,
    pub volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe: Option<f64>,
    pub beta: Option<f64>,
    pub correlation: Option<f64>,
}

impl Metrics {
    /// True when no field could be computed.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn with_relative(mut self, relative: RelativeMetrics) -> Self {
        self.beta = relative.beta;
        self.correlation = relative.correlation;
        self
    }
}

/// Statistics of a series measured against a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativeMetrics {
    pub beta: Option<f64>,
    pub correlation: Option<f64>,
}
