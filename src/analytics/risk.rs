//! Concentration, stress scenarios and market risk for a set of holdings.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{PricePoint, Symbol};

use super::metrics::{beta_and_correlation, MetricParams};

/// Default market shocks applied by [`scenario_impacts`].
pub const DEFAULT_SHOCKS: [f64; 3] = [-0.1, -0.2, -0.3];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionWeight {
    pub symbol: String,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioImpact {
    pub shock: f64,
    pub portfolio_change: f64,
    pub holding_changes: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketRisk {
    pub benchmark: String,
    pub symbols_used: Vec<String>,
    /// Number of dates common to every series.
    pub coverage_days: usize,
    pub volatility: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub beta: Option<f64>,
    pub avg_correlation: Option<f64>,
}

/// Portfolio weights from per-symbol market values.
///
/// Values for the same symbol are summed; negative values count as zero.
/// Returns an empty map when the portfolio has no positive value.
pub fn weights_from_positions(positions: &[(Symbol, f64)]) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for (symbol, value) in positions {
        *totals.entry(symbol.to_string()).or_insert(0.0) += value.max(0.0);
    }
    let portfolio_value: f64 = totals.values().sum();
    if portfolio_value <= 0.0 {
        return BTreeMap::new();
    }
    totals
        .into_iter()
        .filter(|(_, value)| *value > 0.0)
        .map(|(symbol, value)| (symbol, value / portfolio_value))
        .collect()
}

/// Herfindahl-Hirschman index: sum of squared weights.
pub fn herfindahl_index(weights: &BTreeMap<String, f64>) -> f64 {
    weights.values().map(|w| w * w).sum()
}

/// The `n` largest positions by weight.
pub fn top_positions(weights: &BTreeMap<String, f64>, n: usize) -> Vec<PositionWeight> {
    let mut positions: Vec<PositionWeight> = weights
        .iter()
        .map(|(symbol, weight)| PositionWeight {
            symbol: symbol.clone(),
            weight: *weight,
        })
        .collect();
    positions.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    positions.truncate(n);
    positions
}

/// Value change of the portfolio and of each holding under uniform shocks.
pub fn scenario_impacts(
    portfolio_value: f64,
    weights: &BTreeMap<String, f64>,
    shocks: &[f64],
) -> Vec<ScenarioImpact> {
    shocks
        .iter()
        .map(|&shock| ScenarioImpact {
            shock,
            portfolio_change: portfolio_value * shock,
            holding_changes: weights
                .iter()
                .map(|(symbol, weight)| (symbol.clone(), weight * portfolio_value * shock))
                .collect(),
        })
        .collect()
}

fn returns_on(dates: &[NaiveDate], by_date: &BTreeMap<NaiveDate, f64>) -> Vec<f64> {
    dates
        .windows(2)
        .map(|pair| {
            let prev = by_date[&pair[0]];
            let curr = by_date[&pair[1]];
            if prev > 0.0 {
                curr / prev - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

fn population_stddev(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    Some((values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt())
}

/// Largest decline of the compounded return path, as a positive fraction.
fn compounded_drawdown(returns: &[f64]) -> Option<f64> {
    if returns.is_empty() {
        return None;
    }
    let mut level = 1.0_f64;
    let mut peak = f64::MIN;
    let mut worst = 0.0_f64;
    for r in returns {
        level *= 1.0 + r;
        peak = peak.max(level);
        if peak > 0.0 {
            worst = worst.max(1.0 - level / peak);
        }
    }
    Some(worst)
}

/// Weighted-portfolio risk against `benchmark`, using only dates on which
/// every involved series has a price.
///
/// Returns `None` when the benchmark or every weighted symbol is missing,
/// or when fewer than two common dates exist.
pub fn market_risk(
    price_series: &BTreeMap<String, Vec<PricePoint>>,
    weights: &BTreeMap<String, f64>,
    benchmark: &str,
    params: &MetricParams,
) -> Option<MarketRisk> {
    let bench_series = price_series.get(benchmark).filter(|s| !s.is_empty())?;

    let symbols: Vec<&String> = weights
        .keys()
        .filter(|s| s.as_str() != benchmark)
        .filter(|s| price_series.get(*s).is_some_and(|series| !series.is_empty()))
        .collect();
    if symbols.is_empty() {
        return None;
    }

    let to_map = |series: &[PricePoint]| -> BTreeMap<NaiveDate, f64> {
        series.iter().map(|p| (p.date, p.value)).collect()
    };
    let bench_by_date = to_map(bench_series);
    let by_symbol: Vec<BTreeMap<NaiveDate, f64>> =
        symbols.iter().map(|s| to_map(&price_series[*s])).collect();

    let mut common: BTreeSet<NaiveDate> = bench_by_date.keys().copied().collect();
    for series in &by_symbol {
        common.retain(|d| series.contains_key(d));
    }
    let dates: Vec<NaiveDate> = common.into_iter().collect();
    if dates.len() < 2 {
        return None;
    }

    let symbol_returns: Vec<Vec<f64>> = by_symbol.iter().map(|s| returns_on(&dates, s)).collect();
    let bench_returns = returns_on(&dates, &bench_by_date);

    let portfolio_returns: Vec<f64> = (0..bench_returns.len())
        .map(|i| {
            symbols
                .iter()
                .zip(&symbol_returns)
                .map(|(symbol, returns)| weights[*symbol] * returns[i])
                .sum()
        })
        .collect();

    let volatility = population_stddev(&portfolio_returns)
        .map(|sd| sd * params.trading_days_per_year.sqrt());
    let beta = beta_and_correlation(&portfolio_returns, &bench_returns).beta;

    let avg_correlation = if symbols.len() > 1 {
        let mut pairs = Vec::new();
        for i in 0..symbols.len() {
            for j in (i + 1)..symbols.len() {
                if let Some(c) = beta_and_correlation(&symbol_returns[i], &symbol_returns[j]).correlation {
                    pairs.push(c);
                }
            }
        }
        (!pairs.is_empty()).then(|| pairs.iter().sum::<f64>() / pairs.len() as f64)
    } else {
        None
    };

    Some(MarketRisk {
        benchmark: benchmark.to_string(),
        symbols_used: symbols.iter().map(|s| s.to_string()).collect(),
        coverage_days: dates.len(),
        volatility,
        max_drawdown: compounded_drawdown(&portfolio_returns),
        beta,
        avg_correlation,
    })
}
