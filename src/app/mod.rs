mod config;
mod import;
mod optimize;
mod report;
mod risk;
mod types;

pub use config::config_output;
pub use import::{import_positions, reconstruct_payload, ReconstructInputs};
pub use optimize::{optimization_methods, optimize_portfolio, OptimizeArgs};
pub use report::{
    chart_report, holdings_report, performance_report, resolve_window, ReportRequest, WindowArgs,
};
pub use risk::risk_report;
pub use types::{
    ChartOutput, HoldingsOutput, ImportOutput, OptimizeOutput, ReportOutput, RiskOutput,
};
