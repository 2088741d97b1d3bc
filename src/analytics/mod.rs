//! Pure, synchronous analytics over in-memory series.
//!
//! Nothing in here performs I/O. Degenerate inputs produce `None` fields or
//! absent keys; only [`optimize`] can fail, when the universe lacks enough
//! overlapping history.

mod chart;
mod engine;
mod holdings;
mod metrics;
pub mod optimize;
pub mod risk;
mod window;

pub use chart::{build_chart_rows, ChartMode, ChartRow, PORTFOLIO_KEY};
pub use engine::{MetricsEngine, PerformanceReport, ReportQuery};
pub use holdings::compute_holding_performance;
pub use metrics::{
    aligned_returns, compute_metrics, compute_relative_metrics, daily_returns, max_drawdown,
    MetricParams,
};
pub use window::{filter_window, point_as_of, value_as_of};
