//! The performance payload exchanged with the backend, and its validation.
//!
//! Everything the analytics engine sees has been through
//! [`PerformancePayload::validate`]: dates parsed, series sorted, values
//! finite.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{
    DateWindow, Dated, HoldingSummary, PortfolioPoint, PositionSnapshot, PricePoint, Symbol,
};

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Invalid performance payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Series {series} is not sorted ascending by date at {date}")]
    Unsorted { series: String, date: NaiveDate },
    #[error("Series {series} has a non-finite value at {date}")]
    NonFinite { series: String, date: NaiveDate },
}

/// Portfolio, benchmark, price and position series for one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformancePayload {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub benchmarks: Vec<String>,
    #[serde(default)]
    pub portfolio: Vec<PortfolioPoint>,
    #[serde(default)]
    pub benchmark_series: BTreeMap<String, Vec<PricePoint>>,
    #[serde(default)]
    pub price_series: BTreeMap<String, Vec<PricePoint>>,
    #[serde(default)]
    pub positions: Vec<PositionSnapshot>,
    #[serde(default)]
    pub holdings: Vec<HoldingSummary>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Canonical spelling of a symbol key. Keys that are not valid symbols are
/// left untouched.
fn symbol_key(raw: &str) -> String {
    Symbol::parse(raw).map_or_else(|_| raw.to_string(), String::from)
}

fn normalize_keys<V>(
    map: BTreeMap<String, V>,
    kind: &str,
    warnings: &mut Vec<String>,
) -> BTreeMap<String, V> {
    let mut out = BTreeMap::new();
    for (raw, value) in map {
        let key = symbol_key(&raw);
        if out.contains_key(&key) {
            warnings.push(format!("Duplicate {kind} series for {key}; keeping the first."));
            continue;
        }
        out.insert(key, value);
    }
    out
}

fn normalize_list(symbols: &mut Vec<String>) {
    let mut seen = std::collections::BTreeSet::new();
    let normalized: Vec<String> = symbols.iter().map(|s| symbol_key(s)).collect();
    *symbols = normalized.into_iter().filter(|s| seen.insert(s.clone())).collect();
}

fn check_sorted<T: Dated>(series: &[T], name: &str) -> Result<(), PayloadError> {
    for pair in series.windows(2) {
        if pair[1].date() <= pair[0].date() {
            return Err(PayloadError::Unsorted {
                series: name.to_string(),
                date: pair[1].date(),
            });
        }
    }
    Ok(())
}

fn check_finite<T: Dated>(
    series: &[T],
    name: &str,
    values: impl Fn(&T) -> Vec<f64>,
) -> Result<(), PayloadError> {
    match series.iter().find(|p| values(*p).iter().any(|v| !v.is_finite())) {
        Some(point) => Err(PayloadError::NonFinite {
            series: name.to_string(),
            date: point.date(),
        }),
        None => Ok(()),
    }
}

impl PerformancePayload {
    /// Parse, normalize and validate a JSON payload.
    pub fn from_json_str(json: &str) -> Result<Self, PayloadError> {
        let mut payload: Self = serde_json::from_str(json)?;
        payload.normalize_symbols();
        payload.validate()?;
        Ok(payload)
    }

    /// Trim and upper-case every symbol the payload carries: series keys,
    /// symbol lists, position shares and holdings. When two series keys
    /// collapse onto one symbol the first (in raw key order) is kept and a
    /// warning is recorded.
    pub fn normalize_symbols(&mut self) {
        let mut warnings = Vec::new();
        self.benchmark_series =
            normalize_keys(std::mem::take(&mut self.benchmark_series), "benchmark", &mut warnings);
        self.price_series =
            normalize_keys(std::mem::take(&mut self.price_series), "price", &mut warnings);
        normalize_list(&mut self.symbols);
        normalize_list(&mut self.benchmarks);
        for snapshot in &mut self.positions {
            let mut shares = BTreeMap::new();
            for (symbol, qty) in std::mem::take(&mut snapshot.shares) {
                *shares.entry(symbol_key(&symbol)).or_insert(0.0) += qty;
            }
            snapshot.shares = shares;
        }
        for holding in &mut self.holdings {
            holding.symbol = symbol_key(&holding.symbol);
        }
        self.warnings.extend(warnings);
    }

    /// Reject series the engine cannot interpret: out-of-order or duplicate
    /// dates, and non-finite values.
    pub fn validate(&self) -> Result<(), PayloadError> {
        check_sorted(&self.portfolio, "portfolio")?;
        check_finite(&self.portfolio, "portfolio", |p| vec![p.value, p.equity, p.cash])?;

        for (kind, map) in [("benchmark", &self.benchmark_series), ("price", &self.price_series)] {
            for (symbol, series) in map {
                let name = format!("{kind}:{symbol}");
                check_sorted(series, &name)?;
                check_finite(series, &name, |p| vec![p.value])?;
            }
        }

        check_sorted(&self.positions, "positions")?;
        check_finite(&self.positions, "positions", |p| {
            p.shares.values().copied().chain([p.cash]).collect()
        })?;

        Ok(())
    }

    /// The full date range the payload covers.
    pub fn window(&self) -> DateWindow {
        DateWindow::new(self.start_date, self.end_date)
    }

    /// First and last portfolio dates, when there is any data.
    pub fn portfolio_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.portfolio.first()?.date, self.portfolio.last()?.date))
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
