use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::analytics::optimize::{Constraints, CovModel, Optimization, ReturnModel};
use crate::analytics::risk::{MarketRisk, PositionWeight, ScenarioImpact};
use crate::analytics::{ChartMode, ChartRow};
use crate::format::MetricsDisplay;
use crate::import::PositionRow;
use crate::models::{DateWindow, HoldingSummary, Metrics};

/// JSON output for `report`
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub window: DateWindow,
    pub portfolio_points: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
    pub metrics: Metrics,
    /// Metrics as shown on the dashboard.
    pub display: MetricsDisplay,
    pub benchmark_metrics: BTreeMap<String, Metrics>,
    pub warnings: Vec<String>,
}

/// JSON output for `holdings`
#[derive(Debug, Serialize)]
pub struct HoldingsOutput {
    pub window: DateWindow,
    pub total_value: f64,
    pub holdings: Vec<HoldingSummary>,
    pub warnings: Vec<String>,
}

/// JSON output for `chart`
#[derive(Debug, Serialize)]
pub struct ChartOutput {
    pub window: DateWindow,
    pub mode: ChartMode,
    /// Every key that appears in at least one row, portfolio first.
    pub series: Vec<String>,
    pub rows: Vec<ChartRow>,
    pub warnings: Vec<String>,
}

/// JSON output for `import-positions`
#[derive(Debug, Serialize)]
pub struct ImportOutput {
    pub account_name: Option<String>,
    pub as_of: Option<String>,
    pub symbols: Vec<String>,
    pub cash: Decimal,
    pub rows: Vec<PositionRow>,
}

/// JSON output for `risk`
#[derive(Debug, Serialize)]
pub struct RiskOutput {
    pub portfolio_value: f64,
    pub herfindahl_index: f64,
    pub top_positions: Vec<PositionWeight>,
    pub scenarios: Vec<ScenarioImpact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketRisk>,
    pub warnings: Vec<String>,
}

/// JSON output for `optimize`
#[derive(Debug, Serialize)]
pub struct OptimizeOutput {
    #[serde(flatten)]
    pub result: Optimization,
    pub covariance_model: CovModel,
    pub return_model: ReturnModel,
    pub constraints: Constraints,
}
