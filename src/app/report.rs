use chrono::NaiveDate;

use crate::analytics::{ChartMode, MetricsEngine, PerformanceReport, ReportQuery, PORTFOLIO_KEY};
use crate::config::Config;
use crate::format::MetricsDisplay;
use crate::models::DateWindow;
use crate::payload::PerformancePayload;
use crate::range::RangePreset;

use super::types::{ChartOutput, HoldingsOutput, ReportOutput};

/// Window selection as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct WindowArgs {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub range: Option<RangePreset>,
}

/// Everything a report command can ask for.
#[derive(Debug, Clone, Default)]
pub struct ReportRequest {
    pub window: WindowArgs,
    pub benchmark: Option<String>,
    pub overlays: Vec<String>,
    pub mode: Option<ChartMode>,
}

/// Pick the report window.
///
/// The end is `--end` or the last portfolio date. The start is `--start`,
/// else the range preset (or the configured default) counted back from the
/// end and clamped to the first portfolio date. A payload without
/// portfolio points falls back to its declared start and end dates.
pub fn resolve_window(
    payload: &PerformancePayload,
    args: &WindowArgs,
    default_range: RangePreset,
) -> DateWindow {
    let (first, last) = payload
        .portfolio_bounds()
        .unwrap_or((payload.start_date, payload.end_date));
    let end = args.end.unwrap_or(last);
    match args.start {
        Some(start) => DateWindow::new(start, end),
        None => args.range.unwrap_or(default_range).resolve(first, end),
    }
}

fn run_report(
    payload: &PerformancePayload,
    config: &Config,
    request: &ReportRequest,
) -> PerformanceReport {
    let window = resolve_window(payload, &request.window, config.analytics.default_range);
    let query = ReportQuery {
        window,
        benchmark: request.benchmark.clone(),
        overlays: request.overlays.clone(),
        mode: request.mode.unwrap_or(config.analytics.chart_mode),
    };
    MetricsEngine::new(&config.analytics).report(payload, &query)
}

pub fn performance_report(
    payload: &PerformancePayload,
    config: &Config,
    request: &ReportRequest,
) -> ReportOutput {
    let report = run_report(payload, config, request);
    ReportOutput {
        window: report.window,
        portfolio_points: report.portfolio_points,
        display: MetricsDisplay::new(&report.metrics, &config.display),
        benchmark: report.benchmark,
        metrics: report.metrics,
        benchmark_metrics: report.benchmark_metrics,
        warnings: report.warnings,
    }
}

pub fn holdings_report(
    payload: &PerformancePayload,
    config: &Config,
    request: &ReportRequest,
) -> HoldingsOutput {
    let report = run_report(payload, config, request);
    HoldingsOutput {
        window: report.window,
        total_value: report.holdings.iter().map(|h| h.current_value).sum(),
        holdings: report.holdings,
        warnings: report.warnings,
    }
}

pub fn chart_report(
    payload: &PerformancePayload,
    config: &Config,
    request: &ReportRequest,
) -> ChartOutput {
    let report = run_report(payload, config, request);

    let mut series: Vec<String> = Vec::new();
    for row in &report.chart {
        for key in row.values.keys() {
            if !series.contains(key) {
                series.push(key.clone());
            }
        }
    }
    series.sort_by_key(|key| (key != PORTFOLIO_KEY, key.clone()));

    ChartOutput {
        window: report.window,
        mode: report.chart_mode,
        series,
        rows: report.chart,
        warnings: report.warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PortfolioPoint, PricePoint};
    use std::collections::BTreeMap;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn payload() -> PerformancePayload {
        PerformancePayload {
            start_date: d(1),
            end_date: d(31),
            symbols: vec!["AAPL".to_string()],
            benchmarks: vec!["SPY".to_string()],
            portfolio: (5..=20)
                .map(|day| PortfolioPoint::from_value(d(day), 1000.0 + day as f64))
                .collect(),
            benchmark_series: BTreeMap::from([(
                "SPY".to_string(),
                (5..=20).map(|day| PricePoint::new(d(day), 500.0)).collect(),
            )]),
            price_series: BTreeMap::from([(
                "AAPL".to_string(),
                vec![PricePoint::new(d(5), 10.0), PricePoint::new(d(20), 12.0)],
            )]),
            positions: Vec::new(),
            holdings: Vec::new(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn window_defaults_to_portfolio_bounds() {
        let window = resolve_window(&payload(), &WindowArgs::default(), RangePreset::All);
        assert_eq!(window, DateWindow::new(d(5), d(20)));
    }

    #[test]
    fn window_range_counts_back_from_explicit_end() {
        let args = WindowArgs {
            end: Some(d(18)),
            range: Some(RangePreset::Days(7)),
            ..Default::default()
        };
        let window = resolve_window(&payload(), &args, RangePreset::All);
        assert_eq!(window, DateWindow::new(d(11), d(18)));
    }

    #[test]
    fn explicit_start_wins_over_range() {
        let args = WindowArgs {
            start: Some(d(1)),
            range: Some(RangePreset::Days(2)),
            ..Default::default()
        };
        let window = resolve_window(&payload(), &args, RangePreset::All);
        assert_eq!(window, DateWindow::new(d(1), d(20)));
    }

    #[test]
    fn chart_lists_portfolio_first() {
        let request = ReportRequest {
            overlays: vec!["aapl".to_string()],
            ..Default::default()
        };
        let chart = chart_report(&payload(), &Config::default(), &request);
        assert_eq!(chart.mode, ChartMode::Indexed);
        assert_eq!(chart.series, vec!["portfolio", "AAPL", "SPY"]);
        assert_eq!(chart.rows.first().and_then(|r| r.get(PORTFOLIO_KEY)), Some(0.0));
    }

    #[test]
    fn report_renders_display_values() {
        let output = performance_report(&payload(), &Config::default(), &ReportRequest::default());
        assert_eq!(output.portfolio_points, 16);
        assert_eq!(output.benchmark.as_deref(), Some("SPY"));
        assert_eq!(output.display.total_abs, "$15.00");
        // Constant benchmark: no variance, so no beta.
        assert_eq!(output.display.beta, "—");
    }
}
