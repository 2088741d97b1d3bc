use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{PortfolioPoint, PricePoint, Valued};

use super::window::Resampler;

/// Key used for the portfolio series in chart rows.
pub const PORTFOLIO_KEY: &str = "portfolio";

/// How series values are expressed in chart rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartMode {
    /// Percent change from each series' own first value in the window.
    #[default]
    Indexed,
    /// Raw values.
    Value,
}

impl FromStr for ChartMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "indexed" | "index" | "percent" => Ok(Self::Indexed),
            "value" | "raw" => Ok(Self::Value),
            _ => anyhow::bail!("Invalid chart mode: {value}. Use: indexed, value"),
        }
    }
}

impl fmt::Display for ChartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indexed => f.write_str("indexed"),
            Self::Value => f.write_str("value"),
        }
    }
}

/// One chart row: a date plus one optional value per series.
///
/// A series with no observation yet is absent from `values`; consumers must
/// draw that as a gap, not as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartRow {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl ChartRow {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}

struct Track<'a, T> {
    key: &'a str,
    resampler: Resampler<'a, T>,
    /// First value of the windowed series; `None` when that value is not
    /// positive or the series is empty.
    base: Option<f64>,
}

impl<'a, T: Valued> Track<'a, T> {
    fn new(key: &'a str, series: &'a [T]) -> Self {
        Self {
            key,
            resampler: Resampler::new(series),
            base: series.first().map(Valued::value).filter(|v| *v > 0.0),
        }
    }

    fn value_at(&mut self, date: NaiveDate, mode: ChartMode) -> Option<f64> {
        let raw = self.resampler.at(date)?;
        match mode {
            ChartMode::Value => Some(raw),
            ChartMode::Indexed => self.base.map(|base| (raw / base - 1.0) * 100.0),
        }
    }
}

/// Chart-ready rows on the portfolio's date axis.
///
/// All series must already be clipped to the report window. Every series is
/// resampled onto the portfolio dates with the last observation carried
/// forward; in indexed mode each one is measured against its own first
/// point in the window, even when that point predates the first portfolio
/// date. Overlays whose symbol collides with a benchmark are skipped.
pub fn build_chart_rows(
    portfolio: &[PortfolioPoint],
    benchmarks: &BTreeMap<String, Vec<PricePoint>>,
    overlays: &BTreeMap<String, Vec<PricePoint>>,
    mode: ChartMode,
) -> Vec<ChartRow> {
    let mut port_track = Track::new(PORTFOLIO_KEY, portfolio);
    let mut tracks: Vec<Track<'_, PricePoint>> = benchmarks
        .iter()
        .map(|(key, series)| Track::new(key.as_str(), series.as_slice()))
        .collect();
    for (key, series) in overlays {
        if key == PORTFOLIO_KEY || benchmarks.contains_key(key) {
            tracing::debug!(symbol = %key, "Skipping overlay that duplicates an existing series");
            continue;
        }
        tracks.push(Track::new(key.as_str(), series.as_slice()));
    }

    portfolio
        .iter()
        .map(|point| {
            let mut values = BTreeMap::new();
            if let Some(v) = port_track.value_at(point.date, mode) {
                values.insert(port_track.key.to_string(), v);
            }
            for track in &mut tracks {
                if let Some(v) = track.value_at(point.date, mode) {
                    values.insert(track.key.to_string(), v);
                }
            }
            ChartRow {
                date: point.date,
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn portfolio(vals: &[(u32, f64)]) -> Vec<PortfolioPoint> {
        vals.iter().map(|(day, v)| PortfolioPoint::from_value(d(*day), *v)).collect()
    }

    #[test]
    fn indexed_mode_starts_each_series_at_zero() {
        let port = portfolio(&[(1, 200.0), (2, 210.0), (3, 190.0)]);
        let benchmarks = BTreeMap::from([(
            "SPY".to_string(),
            vec![PricePoint::new(d(2), 50.0), PricePoint::new(d(3), 55.0)],
        )]);
        let rows = build_chart_rows(&port, &benchmarks, &BTreeMap::new(), ChartMode::Indexed);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].get(PORTFOLIO_KEY), Some(0.0));
        assert_eq!(rows[0].get("SPY"), None);
        assert_eq!(rows[1].get("SPY"), Some(0.0));
        assert!((rows[1].get(PORTFOLIO_KEY).unwrap() - 5.0).abs() < 1e-9);
        assert!((rows[2].get("SPY").unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn indexed_base_is_first_sample_in_window_not_first_row() {
        let port = portfolio(&[(3, 1000.0), (6, 1100.0)]);
        let benchmarks = BTreeMap::from([(
            "SPY".to_string(),
            vec![
                PricePoint::new(d(1), 100.0),
                PricePoint::new(d(2), 105.0),
                PricePoint::new(d(6), 110.0),
            ],
        )]);
        let rows = build_chart_rows(&port, &benchmarks, &BTreeMap::new(), ChartMode::Indexed);

        assert_eq!(rows[0].get(PORTFOLIO_KEY), Some(0.0));
        assert!((rows[0].get("SPY").unwrap() - 5.0).abs() < 1e-9);
        assert!((rows[1].get("SPY").unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn value_mode_carries_gaps_forward() {
        let port = portfolio(&[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let overlays = BTreeMap::from([("AAPL".to_string(), vec![PricePoint::new(d(1), 150.0)])]);
        let rows = build_chart_rows(&port, &BTreeMap::new(), &overlays, ChartMode::Value);
        assert!(rows.iter().all(|r| r.get("AAPL") == Some(150.0)));
        assert_eq!(rows[2].get(PORTFOLIO_KEY), Some(3.0));
    }

    #[test]
    fn non_positive_base_leaves_series_absent() {
        let port = portfolio(&[(1, 0.0), (2, 10.0)]);
        let rows = build_chart_rows(&port, &BTreeMap::new(), &BTreeMap::new(), ChartMode::Indexed);
        assert!(rows.iter().all(|r| r.get(PORTFOLIO_KEY).is_none()));
    }

    #[test]
    fn overlay_colliding_with_benchmark_is_skipped() {
        let port = portfolio(&[(1, 1.0)]);
        let benchmarks = BTreeMap::from([("SPY".to_string(), vec![PricePoint::new(d(1), 1.0)])]);
        let overlays = BTreeMap::from([("SPY".to_string(), vec![PricePoint::new(d(1), 99.0)])]);
        let rows = build_chart_rows(&port, &benchmarks, &overlays, ChartMode::Value);
        assert_eq!(rows[0].get("SPY"), Some(1.0));
    }

    #[test]
    fn rows_serialize_flat() {
        let port = portfolio(&[(1, 1.0)]);
        let rows = build_chart_rows(&port, &BTreeMap::new(), &BTreeMap::new(), ChartMode::Value);
        let json = serde_json::to_string(&rows[0]).unwrap();
        assert_eq!(json, r#"{"date":"2025-03-01","portfolio":1.0}"#);
    }

    #[test]
    fn chart_mode_parses() {
        assert_eq!("Indexed".parse::<ChartMode>().unwrap(), ChartMode::Indexed);
        assert_eq!("value".parse::<ChartMode>().unwrap(), ChartMode::Value);
        assert!("candles".parse::<ChartMode>().is_err());
    }
}
