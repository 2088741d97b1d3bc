//! Daily bars to closing-price series, with static fallbacks.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::import::PositionsPayload;
use crate::models::{DateWindow, PricePoint};

use super::transactions::Transaction;

/// Minimum number of bars for a cached range to count as covered.
const MIN_COVERAGE_BARS: usize = 5;

/// One OHLCV bar, keyed by its UTC open timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    #[serde(rename = "t")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "o")]
    pub open: f64,
    #[serde(rename = "h")]
    pub high: f64,
    #[serde(rename = "l")]
    pub low: f64,
    #[serde(rename = "c")]
    pub close: f64,
    #[serde(rename = "v", default)]
    pub volume: f64,
}

pub type BarsBySymbol = BTreeMap<String, Vec<Bar>>;

/// Read a `{ "SYMBOL": [bar, ...] }` file.
///
/// Bars come back sorted by timestamp. A timestamp listed twice keeps the
/// bar that appears last in the file.
pub fn load_bars(path: &Path) -> Result<BarsBySymbol> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read bars file: {}", path.display()))?;
    let bars: BarsBySymbol = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse bars file: {}", path.display()))?;
    Ok(merge_bars(&BarsBySymbol::new(), &bars))
}

/// Union of two bar sets. A timestamp present in both keeps the bar from
/// `fresh`; each symbol's bars come out sorted.
pub fn merge_bars(existing: &BarsBySymbol, fresh: &BarsBySymbol) -> BarsBySymbol {
    let mut merged = BarsBySymbol::new();
    for symbol in existing.keys().chain(fresh.keys()) {
        if merged.contains_key(symbol) {
            continue;
        }
        let mut by_time: BTreeMap<DateTime<Utc>, Bar> = BTreeMap::new();
        for bar in existing
            .get(symbol)
            .into_iter()
            .chain(fresh.get(symbol))
            .flatten()
        {
            by_time.insert(bar.timestamp, bar.clone());
        }
        merged.insert(symbol.clone(), by_time.into_values().collect());
    }
    merged
}

/// Whether sorted `bars` span `[start, end]` with enough points to trust.
pub fn has_coverage(bars: &[Bar], start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    match (bars.first(), bars.last()) {
        (Some(first), Some(last)) => {
            first.timestamp <= start && last.timestamp >= end && bars.len() >= MIN_COVERAGE_BARS
        }
        _ => false,
    }
}

/// Closing prices per symbol, clipped to `window`.
///
/// Symbols without a single bar in the window fall back to a flat
/// two-point series at their `fallback_prices` entry, and a warning is
/// recorded. Symbols with neither are left out.
pub fn price_history_from_bars(
    bars: &BarsBySymbol,
    fallback_prices: &BTreeMap<String, f64>,
    window: DateWindow,
    warnings: &mut Vec<String>,
) -> BTreeMap<String, Vec<PricePoint>> {
    let mut history: BTreeMap<String, Vec<PricePoint>> = BTreeMap::new();

    for (symbol, series) in bars {
        let mut points: Vec<PricePoint> = Vec::new();
        for bar in series {
            let date = bar.timestamp.date_naive();
            if !window.contains(date) || !bar.close.is_finite() {
                continue;
            }
            // Keep the latest bar of a day.
            match points.last_mut() {
                Some(last) if last.date == date => last.value = bar.close,
                _ => points.push(PricePoint::new(date, bar.close)),
            }
        }
        if !points.is_empty() {
            history.insert(symbol.clone(), points);
        }
    }

    for (symbol, price) in fallback_prices {
        if history.contains_key(symbol) {
            continue;
        }
        let mut points = vec![PricePoint::new(window.start, *price)];
        if window.end > window.start {
            points.push(PricePoint::new(window.end, *price));
        }
        history.insert(symbol.clone(), points);
        tracing::warn!(symbol = %symbol, price, "no market data; using static price");
        warnings.push(format!(
            "No market data for {symbol}; using static price ${price:.2}."
        ));
    }

    history
}

/// Last quoted price per position, or cost basis over quantity when the
/// export has no price.
pub fn fallback_prices_from_positions(import: &PositionsPayload) -> BTreeMap<String, f64> {
    let mut prices = BTreeMap::new();
    for row in import.positions() {
        let Some(symbol) = row.position_symbol() else {
            continue;
        };
        let price = match (row.price, row.cost_basis, row.quantity) {
            (Some(price), _, _) => price.to_f64(),
            (None, Some(cost), Some(qty)) if qty.is_sign_positive() && !qty.is_zero() => {
                (cost / qty).to_f64()
            }
            _ => None,
        };
        if let Some(price) = price {
            prices.insert(symbol, price);
        }
    }
    prices
}

/// First positive trade price per symbol.
pub fn fallback_prices_from_transactions(txns: &[Transaction]) -> BTreeMap<String, f64> {
    let mut prices = BTreeMap::new();
    for txn in txns {
        let Some(symbol) = &txn.symbol else {
            continue;
        };
        if txn.quantity.is_sign_negative() || txn.quantity.is_zero() {
            continue;
        }
        if txn.price.is_sign_positive() && !txn.price.is_zero() {
            if let Some(price) = txn.price.to_f64() {
                prices.entry(symbol.clone()).or_insert(price);
            }
        }
    }
    prices
}
