//! Growth curves of fixed-weight allocations, their metrics, and the trades
//! that move the current allocation to the recommended one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::analytics::metrics::{
    compute_metrics, compute_relative_metrics, daily_returns, population_stddev, MetricParams,
};
use crate::models::{Metrics, PricePoint};

use super::OptimizeParams;

pub(crate) const RECOMMENDED: &str = "recommended";
pub(crate) const CURRENT: &str = "current";
pub(crate) const EQUAL_WEIGHT: &str = "equal_weight";
pub(crate) const BENCHMARK: &str = "benchmark";

/// Share changes smaller than this are reported as `hold`.
const SHARE_EPSILON: f64 = 1e-6;

/// Curves shorter than this many calendar days report no annualized return.
const MIN_ANNUALIZATION_DAYS: i64 = 251;

/// Growth of one unit under each allocation, by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestPoint {
    pub date: NaiveDate,
    pub recommended: f64,
    pub current: f64,
    pub equal_weight: f64,
    pub benchmark: Option<f64>,
}

/// Curve statistics plus tracking error against the benchmark curve.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurveMetrics {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub tracking_error: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
            Self::Hold => f.write_str("hold"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSuggestion {
    pub symbol: String,
    pub action: TradeAction,
    /// Signed: negative for sells.
    pub shares: f64,
    pub notional: f64,
}

fn growth_curve(returns: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut curve = vec![1.0];
    for r in returns {
        let last = curve.last().copied().unwrap_or(1.0);
        curve.push(last * (1.0 + r));
    }
    curve
}

fn points(dates: &[NaiveDate], curve: &[f64]) -> Vec<PricePoint> {
    dates
        .iter()
        .zip(curve)
        .map(|(date, value)| PricePoint::new(*date, *value))
        .collect()
}

fn curve_metrics(
    curve: &[PricePoint],
    benchmark: Option<&[PricePoint]>,
    params: &OptimizeParams,
) -> CurveMetrics {
    let metric_params = MetricParams {
        trading_days_per_year: params.trading_days_per_year,
        days_per_year: params.days_per_year,
        min_annualization_days: MIN_ANNUALIZATION_DAYS,
    };
    let mut metrics = compute_metrics(curve, &metric_params);
    let mut tracking_error = None;
    if let Some(benchmark) = benchmark {
        metrics = metrics.with_relative(compute_relative_metrics(curve, benchmark));
        let diffs: Vec<f64> = daily_returns(curve)
            .into_iter()
            .zip(daily_returns(benchmark))
            .map(|(r, b)| r - b)
            .collect();
        tracking_error = population_stddev(&diffs)
            .map(|sd| sd * params.trading_days_per_year.sqrt())
            .filter(|te| te.is_finite());
    }
    CurveMetrics {
        metrics,
        tracking_error,
    }
}

/// Benchmark growth curve on `dates`, only when the benchmark has a price on
/// every one of them.
fn benchmark_curve(dates: &[NaiveDate], benchmark: &[PricePoint]) -> Option<Vec<f64>> {
    let by_date: BTreeMap<NaiveDate, f64> = benchmark.iter().map(|p| (p.date, p.value)).collect();
    let prices: Vec<f64> = dates
        .iter()
        .map(|date| by_date.get(date).copied())
        .collect::<Option<_>>()?;
    let returns = prices
        .windows(2)
        .map(|pair| if pair[0] > 0.0 { pair[1] / pair[0] - 1.0 } else { 0.0 });
    Some(growth_curve(returns))
}

/// Backtest each `(name, weights)` allocation over the aligned returns.
///
/// `allocations` must contain the recommended, current and equal-weight
/// vectors.
pub(crate) fn backtest_curves(
    dates: &[NaiveDate],
    returns: &DMatrix<f64>,
    allocations: &[(&str, &DVector<f64>)],
    benchmark: Option<&[PricePoint]>,
    params: &OptimizeParams,
) -> (Vec<BacktestPoint>, BTreeMap<String, CurveMetrics>) {
    let curves: BTreeMap<&str, Vec<PricePoint>> = allocations
        .iter()
        .map(|(name, weights)| {
            let portfolio_returns = returns * *weights;
            (*name, points(dates, &growth_curve(portfolio_returns.iter().copied())))
        })
        .collect();
    let bench = benchmark
        .and_then(|series| benchmark_curve(dates, series))
        .map(|curve| points(dates, &curve));

    let mut metrics = BTreeMap::new();
    if let Some(bench) = &bench {
        metrics.insert(BENCHMARK.to_string(), curve_metrics(bench, None, params));
    }
    for (name, curve) in &curves {
        metrics.insert(name.to_string(), curve_metrics(curve, bench.as_deref(), params));
    }

    let value_at = |name: &str, idx: usize| {
        curves
            .get(name)
            .and_then(|curve| curve.get(idx))
            .map_or(f64::NAN, |p| p.value)
    };
    let series = dates
        .iter()
        .enumerate()
        .map(|(idx, date)| BacktestPoint {
            date: *date,
            recommended: value_at(RECOMMENDED, idx),
            current: value_at(CURRENT, idx),
            equal_weight: value_at(EQUAL_WEIGHT, idx),
            benchmark: bench.as_ref().and_then(|b| b.get(idx)).map(|p| p.value),
        })
        .collect();

    (series, metrics)
}

/// Trades that take each symbol from its current to its target weight of
/// `total_capital`. With a `budget`, all buys are scaled down together so
/// their notional fits in it; sells are scaled by the same factor.
pub(crate) fn trade_suggestions(
    symbols: &[String],
    target: &DVector<f64>,
    current: &DVector<f64>,
    latest_prices: &[Option<f64>],
    total_capital: f64,
    budget: Option<f64>,
) -> Vec<TradeSuggestion> {
    let deltas: Vec<f64> = target
        .iter()
        .zip(current.iter())
        .map(|(t, c)| (t - c) * total_capital)
        .collect();
    let buy_notional: f64 = deltas.iter().filter(|d| **d > 0.0).sum();
    let scale = match budget {
        Some(budget) if budget > 0.0 && buy_notional > budget => budget / buy_notional,
        _ => 1.0,
    };

    symbols
        .iter()
        .zip(deltas)
        .zip(latest_prices)
        .map(|((symbol, delta), price)| {
            let notional = delta * scale;
            let shares = match price {
                Some(price) if *price > 0.0 => notional / price,
                _ => 0.0,
            };
            let action = if shares > SHARE_EPSILON {
                TradeAction::Buy
            } else if shares < -SHARE_EPSILON {
                TradeAction::Sell
            } else {
                TradeAction::Hold
            };
            TradeSuggestion {
                symbol: symbol.clone(),
                action,
                shares,
                notional,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn curves_start_at_one_and_compound() {
        let returns = DMatrix::from_row_slice(2, 2, &[0.10, 0.0, 0.10, 0.0]);
        let all_first = DVector::from_row_slice(&[1.0, 0.0]);
        let half = DVector::from_row_slice(&[0.5, 0.5]);
        let (series, metrics) = backtest_curves(
            &dates(3),
            &returns,
            &[(RECOMMENDED, &all_first), (CURRENT, &half), (EQUAL_WEIGHT, &half)],
            None,
            &OptimizeParams::default(),
        );
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].recommended, 1.0);
        assert!((series[2].recommended - 1.21).abs() < 1e-12);
        assert!((series[2].current - 1.1025).abs() < 1e-12);
        assert_eq!(series[2].benchmark, None);
        assert_eq!(metrics.len(), 3);
        assert!(metrics[RECOMMENDED].tracking_error.is_none());
        // Three days is far too short to annualize.
        assert!(metrics[RECOMMENDED].metrics.annualized.is_none());
    }

    #[test]
    fn benchmark_curve_needs_every_date() {
        let returns = DMatrix::from_row_slice(2, 1, &[0.01, 0.02]);
        let w = DVector::from_row_slice(&[1.0]);
        let allocations = [(RECOMMENDED, &w), (CURRENT, &w), (EQUAL_WEIGHT, &w)];
        let d = dates(3);
        let full: Vec<PricePoint> = d
            .iter()
            .zip([50.0, 50.5, 51.51])
            .map(|(date, v)| PricePoint::new(*date, v))
            .collect();

        let (series, metrics) =
            backtest_curves(&d, &returns, &allocations, Some(&full), &OptimizeParams::default());
        assert_eq!(series[0].benchmark, Some(1.0));
        assert!(metrics.contains_key(BENCHMARK));
        // Identical return streams: no tracking error, perfect correlation.
        let rec = metrics[RECOMMENDED];
        assert!(rec.tracking_error.unwrap() < 1e-9);
        assert!((rec.metrics.correlation.unwrap() - 1.0).abs() < 1e-9);

        let gappy = vec![full[0], full[2]];
        let (series, metrics) =
            backtest_curves(&d, &returns, &allocations, Some(&gappy), &OptimizeParams::default());
        assert!(series.iter().all(|p| p.benchmark.is_none()));
        assert!(!metrics.contains_key(BENCHMARK));
    }

    #[test]
    fn curve_metrics_serialize_flat() {
        let json = serde_json::to_value(CurveMetrics::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("sharpe"));
        assert!(obj.contains_key("tracking_error"));
    }

    #[test]
    fn trades_move_current_to_target() {
        let trades = trade_suggestions(
            &symbols(&["AAA", "BBB", "CCC"]),
            &DVector::from_row_slice(&[0.5, 0.5, 0.0]),
            &DVector::from_row_slice(&[0.25, 0.5, 0.25]),
            &[Some(10.0), Some(20.0), None],
            1000.0,
            None,
        );
        assert_eq!(trades[0].action, TradeAction::Buy);
        assert_eq!(trades[0].shares, 25.0);
        assert_eq!(trades[1].action, TradeAction::Hold);
        // No price: notional is still reported, shares cannot be.
        assert_eq!(trades[2].action, TradeAction::Hold);
        assert_eq!(trades[2].notional, -250.0);
        assert_eq!(serde_json::to_value(trades[0].action).unwrap(), "buy");
    }

    #[test]
    fn budget_scales_buys_and_sells_together() {
        let trades = trade_suggestions(
            &symbols(&["AAA", "BBB"]),
            &DVector::from_row_slice(&[1.0, 0.0]),
            &DVector::from_row_slice(&[0.0, 1.0]),
            &[Some(10.0), Some(10.0)],
            1000.0,
            Some(100.0),
        );
        assert_eq!(trades[0].notional, 100.0);
        assert_eq!(trades[1].notional, -100.0);
        assert_eq!(trades[1].action, TradeAction::Sell);
    }
}
