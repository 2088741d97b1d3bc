#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;
use wealthwise::models::{HoldingSummary, PortfolioPoint, PositionSnapshot, PricePoint};
use wealthwise::payload::PerformancePayload;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily dates starting at `start`.
pub fn days(start: NaiveDate, n: usize) -> Vec<NaiveDate> {
    start.iter_days().take(n).collect()
}

pub fn portfolio_series(start: NaiveDate, values: &[f64]) -> Vec<PortfolioPoint> {
    days(start, values.len())
        .into_iter()
        .zip(values)
        .map(|(d, v)| PortfolioPoint::from_value(d, *v))
        .collect()
}

pub fn price_series(start: NaiveDate, values: &[f64]) -> Vec<PricePoint> {
    days(start, values.len())
        .into_iter()
        .zip(values)
        .map(|(d, v)| PricePoint::new(d, *v))
        .collect()
}

pub fn snapshot(date: NaiveDate, shares: &[(&str, f64)], cash: f64) -> PositionSnapshot {
    PositionSnapshot::new(
        date,
        shares.iter().map(|(s, q)| (s.to_string(), *q)).collect(),
        cash,
    )
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// Ten days of portfolio, SPY and AAPL data with one position change.
pub fn sample_payload() -> PerformancePayload {
    let start = date(2025, 1, 1);
    let values = [
        1000.0, 1010.0, 1005.0, 1020.0, 990.0, 1000.0, 1030.0, 1040.0, 1035.0, 1050.0,
    ];
    let spy = [
        500.0, 502.0, 501.0, 505.0, 498.0, 500.0, 506.0, 508.0, 507.0, 510.0,
    ];
    let aapl = [
        100.0, 101.0, 100.5, 102.0, 99.0, 100.0, 103.0, 104.0, 103.5, 105.0,
    ];
    PerformancePayload {
        start_date: start,
        end_date: date(2025, 1, 10),
        symbols: vec!["AAPL".to_string()],
        benchmarks: vec!["SPY".to_string()],
        portfolio: portfolio_series(start, &values),
        benchmark_series: BTreeMap::from([("SPY".to_string(), price_series(start, &spy))]),
        price_series: BTreeMap::from([("AAPL".to_string(), price_series(start, &aapl))]),
        positions: vec![
            snapshot(start, &[("AAPL", 10.0)], 0.0),
            snapshot(date(2025, 1, 5), &[("AAPL", 10.0), ("MSFT", 0.0)], 0.0),
        ],
        holdings: vec![HoldingSummary::new("AAPL", "Apple Inc").with_cost_basis(900.0)],
        warnings: Vec::new(),
    }
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}
