use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AnalyticsConfig;
use crate::models::{DateWindow, HoldingSummary, Metrics, PortfolioPoint, PricePoint, RelativeMetrics};
use crate::payload::PerformancePayload;

use super::chart::{build_chart_rows, ChartMode, ChartRow};
use super::holdings::compute_holding_performance;
use super::metrics::{compute_metrics, compute_relative_metrics, MetricParams};
use super::window::filter_window;

/// What to compute for one dashboard view.
#[derive(Debug, Clone)]
pub struct ReportQuery {
    pub window: DateWindow,
    /// Benchmark used for beta/correlation. Defaults to the first configured
    /// benchmark present in the payload.
    pub benchmark: Option<String>,
    /// Price-series symbols to draw next to the portfolio.
    pub overlays: Vec<String>,
    pub mode: ChartMode,
}

impl ReportQuery {
    pub fn new(window: DateWindow) -> Self {
        Self {
            window,
            benchmark: None,
            overlays: Vec::new(),
            mode: ChartMode::default(),
        }
    }
}

/// Everything a performance dashboard shows for one window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub window: DateWindow,
    pub portfolio_points: usize,
    pub metrics: Metrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<String>,
    pub benchmark_metrics: BTreeMap<String, Metrics>,
    pub holdings: Vec<HoldingSummary>,
    pub chart_mode: ChartMode,
    pub chart: Vec<ChartRow>,
    pub warnings: Vec<String>,
}

/// Windowed analytics over already-loaded series.
///
/// The engine only holds configuration; every call recomputes from its
/// inputs and never mutates them.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    params: MetricParams,
    benchmarks: Vec<String>,
}

impl MetricsEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            params: config.metric_params(),
            benchmarks: config.benchmarks.clone(),
        }
    }

    pub fn params(&self) -> &MetricParams {
        &self.params
    }

    pub fn metrics(&self, portfolio: &[PortfolioPoint], window: DateWindow) -> Metrics {
        compute_metrics(filter_window(portfolio, window), &self.params)
    }

    pub fn relative(
        &self,
        portfolio: &[PortfolioPoint],
        benchmark: &[PricePoint],
        window: DateWindow,
    ) -> RelativeMetrics {
        compute_relative_metrics(filter_window(portfolio, window), filter_window(benchmark, window))
    }

    pub fn holdings(&self, payload: &PerformancePayload, window: DateWindow) -> Vec<HoldingSummary> {
        compute_holding_performance(
            &payload.holdings,
            &payload.positions,
            &payload.price_series,
            window,
        )
    }

    /// Chart rows on the windowed portfolio axis. `overlays` must already be
    /// windowed.
    pub fn chart(
        &self,
        payload: &PerformancePayload,
        overlays: &BTreeMap<String, Vec<PricePoint>>,
        window: DateWindow,
        mode: ChartMode,
    ) -> Vec<ChartRow> {
        let benchmarks: BTreeMap<String, Vec<PricePoint>> = payload
            .benchmark_series
            .iter()
            .map(|(symbol, series)| (symbol.clone(), filter_window(series, window).to_vec()))
            .collect();
        build_chart_rows(
            filter_window(&payload.portfolio, window),
            &benchmarks,
            overlays,
            mode,
        )
    }

    /// Resolve which benchmark drives beta/correlation.
    pub fn select_benchmark(&self, payload: &PerformancePayload, requested: Option<&str>) -> Option<String> {
        if let Some(requested) = requested {
            let requested = requested.trim().to_uppercase();
            return payload.benchmark_series.contains_key(&requested).then_some(requested);
        }
        self.benchmarks
            .iter()
            .chain(payload.benchmarks.iter())
            .find(|b| payload.benchmark_series.contains_key(b.as_str()))
            .cloned()
    }

    pub fn report(&self, payload: &PerformancePayload, query: &ReportQuery) -> PerformanceReport {
        let window = query.window;
        let portfolio = filter_window(&payload.portfolio, window);
        let mut warnings = payload.warnings.clone();

        debug!(
            window = %window,
            points = portfolio.len(),
            total_points = payload.portfolio.len(),
            "Computing performance report"
        );

        let benchmark = self.select_benchmark(payload, query.benchmark.as_deref());
        if let (Some(requested), None) = (query.benchmark.as_deref(), benchmark.as_ref()) {
            warnings.push(format!("Benchmark {requested} is not available in this payload."));
        }

        let windowed_benchmarks: BTreeMap<String, Vec<PricePoint>> = payload
            .benchmark_series
            .iter()
            .map(|(symbol, series)| (symbol.clone(), filter_window(series, window).to_vec()))
            .collect();

        let mut metrics = compute_metrics(portfolio, &self.params);
        if let Some(series) = benchmark.as_ref().and_then(|b| windowed_benchmarks.get(b)) {
            metrics = metrics.with_relative(compute_relative_metrics(portfolio, series));
        }

        let benchmark_metrics = windowed_benchmarks
            .iter()
            .map(|(symbol, series)| (symbol.clone(), compute_metrics(series, &self.params)))
            .collect();

        let mut overlays = BTreeMap::new();
        for symbol in &query.overlays {
            let symbol = symbol.trim().to_uppercase();
            match payload.price_series.get(&symbol) {
                Some(series) => {
                    overlays.insert(symbol, filter_window(series, window).to_vec());
                }
                None => warnings.push(format!("No price series for overlay {symbol}.")),
            }
        }

        let holdings = self.holdings(payload, window);
        let chart = build_chart_rows(portfolio, &windowed_benchmarks, &overlays, query.mode);

        PerformanceReport {
            window,
            portfolio_points: portfolio.len(),
            metrics,
            benchmark,
            benchmark_metrics,
            holdings,
            chart_mode: query.mode,
            chart,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
    }

    fn payload() -> PerformancePayload {
        let portfolio = (1..=5)
            .map(|day| PortfolioPoint::from_value(d(day), 100.0 + day as f64))
            .collect();
        let spy = (1..=5).map(|day| PricePoint::new(d(day), 400.0 + (day * day) as f64)).collect();
        PerformancePayload {
            start_date: d(1),
            end_date: d(5),
            symbols: vec![],
            benchmarks: vec!["SPY".to_string()],
            portfolio,
            benchmark_series: BTreeMap::from([("SPY".to_string(), spy)]),
            price_series: BTreeMap::new(),
            positions: vec![],
            holdings: vec![],
            warnings: vec![],
        }
    }

    #[test]
    fn report_fills_relative_metrics_from_default_benchmark() {
        let engine = MetricsEngine::new(&AnalyticsConfig::default());
        let report = engine.report(&payload(), &ReportQuery::new(DateWindow::new(d(2), d(5))));
        assert_eq!(report.portfolio_points, 4);
        assert_eq!(report.benchmark.as_deref(), Some("SPY"));
        assert!(report.metrics.beta.is_some());
        assert!(report.metrics.correlation.is_some());
        assert_eq!(report.chart.len(), 4);
        assert!(report.benchmark_metrics["SPY"].total_return.is_some());
    }

    #[test]
    fn unknown_benchmark_warns_and_skips_relative_metrics() {
        let engine = MetricsEngine::new(&AnalyticsConfig::default());
        let mut query = ReportQuery::new(DateWindow::new(d(1), d(5)));
        query.benchmark = Some("qqq".to_string());
        query.overlays = vec!["AAPL".to_string()];
        let report = engine.report(&payload(), &query);
        assert_eq!(report.benchmark, None);
        assert_eq!(report.metrics.beta, None);
        assert_eq!(report.warnings.len(), 2);
    }

    #[test]
    fn chart_matches_report_rows() {
        let engine = MetricsEngine::new(&AnalyticsConfig::default());
        let window = DateWindow::new(d(2), d(4));
        let report = engine.report(&payload(), &ReportQuery::new(window));
        let chart = engine.chart(&payload(), &BTreeMap::new(), window, ChartMode::Indexed);
        assert_eq!(chart, report.chart);
        assert_eq!(chart[0].get("SPY"), Some(0.0));
    }

    #[test]
    fn report_over_empty_window_is_all_null() {
        let engine = MetricsEngine::new(&AnalyticsConfig::default());
        let report = engine.report(&payload(), &ReportQuery::new(DateWindow::new(d(20), d(25))));
        assert!(report.metrics.is_empty());
        assert!(report.chart.is_empty());
    }
}
