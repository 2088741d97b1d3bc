//! Long-only allocation suggestions from windowed price history.
//!
//! Prices for the universe are aligned on their common dates, turned into
//! daily returns and fed to a covariance estimator. The chosen method turns
//! the covariance into weights, which are then clipped to the position
//! limits and (optionally) blended back toward the current allocation to
//! respect a turnover cap. Weights are always non-negative and sum to one.

mod backtest;
mod covariance;
mod weights;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{DateWindow, PricePoint};

use super::window::{filter_window, value_as_of};

pub use backtest::{BacktestPoint, CurveMetrics, TradeAction, TradeSuggestion};

/// How target weights are derived from the covariance estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizeMethod {
    EqualWeight,
    InverseVol,
    Gmv,
    RiskParity,
    Hrp,
    MaxDiversification,
}

impl OptimizeMethod {
    pub const ALL: [OptimizeMethod; 6] = [
        Self::EqualWeight,
        Self::InverseVol,
        Self::Gmv,
        Self::RiskParity,
        Self::Hrp,
        Self::MaxDiversification,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::EqualWeight => "equal_weight",
            Self::InverseVol => "inverse_vol",
            Self::Gmv => "gmv",
            Self::RiskParity => "risk_parity",
            Self::Hrp => "hrp",
            Self::MaxDiversification => "max_diversification",
        }
    }

    pub fn goal(self) -> &'static str {
        match self {
            Self::EqualWeight | Self::InverseVol => "Simplify",
            Self::Gmv => "Lower volatility",
            Self::RiskParity | Self::Hrp => "Balanced risk",
            Self::MaxDiversification => "More diversified",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::EqualWeight => "Equal Weight",
            Self::InverseVol => "Inverse Volatility",
            Self::Gmv => "Global Minimum Variance",
            Self::RiskParity => "Equal Risk Contribution",
            Self::Hrp => "Hierarchical Risk Parity",
            Self::MaxDiversification => "Maximum Diversification",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::EqualWeight => "Baseline: each holding carries the same weight.",
            Self::InverseVol => "Risk-balanced sizing proportional to 1/volatility.",
            Self::Gmv => "Minimize total portfolio variance with long-only guardrails.",
            Self::RiskParity => "Each holding contributes evenly to portfolio risk.",
            Self::Hrp => {
                "Cluster-aware allocation that reduces concentration from unstable covariances."
            }
            Self::MaxDiversification => {
                "Maximize diversification ratio using vol + correlations only."
            }
        }
    }

    pub fn uses_covariance(self) -> bool {
        !matches!(self, Self::EqualWeight)
    }

    pub fn info(self) -> MethodInfo {
        MethodInfo {
            key: self.key(),
            goal: self.goal(),
            label: self.label(),
            description: self.description(),
            uses_covariance: self.uses_covariance(),
        }
    }
}

impl FromStr for OptimizeMethod {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|method| method.key() == normalized)
            .ok_or_else(|| {
                let keys: Vec<&str> = Self::ALL.iter().map(|m| m.key()).collect();
                anyhow::anyhow!("Invalid optimization method: {value}. Use: {}", keys.join(", "))
            })
    }
}

impl fmt::Display for OptimizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Description of one method, as listed by `optimize --list-methods`.
#[derive(Debug, Clone, Serialize)]
pub struct MethodInfo {
    pub key: &'static str,
    pub goal: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub uses_covariance: bool,
}

/// Covariance estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CovModel {
    /// Unbiased sample covariance.
    Sample,
    /// Sample covariance shrunk toward a scaled identity.
    Shrinkage,
    /// Exponentially weighted, recent returns count more.
    Ewma,
}

impl FromStr for CovModel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sample" => Ok(Self::Sample),
            "shrinkage" | "ledoit_wolf" => Ok(Self::Shrinkage),
            "ewma" => Ok(Self::Ewma),
            _ => anyhow::bail!("Invalid covariance model: {value}. Use: sample, shrinkage, ewma"),
        }
    }
}

impl fmt::Display for CovModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sample => f.write_str("sample"),
            Self::Shrinkage => f.write_str("shrinkage"),
            Self::Ewma => f.write_str("ewma"),
        }
    }
}

/// Annualized expected-return estimate reported next to the weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnModel {
    HistoricalMean,
    /// Historical mean halved.
    ShrunkMean,
    /// Twelve-minus-one month price momentum.
    Momentum,
}

impl FromStr for ReturnModel {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "historical_mean" | "historical" => Ok(Self::HistoricalMean),
            "shrunk_mean" | "shrunk" => Ok(Self::ShrunkMean),
            "momentum" => Ok(Self::Momentum),
            _ => anyhow::bail!(
                "Invalid return model: {value}. Use: historical_mean, shrunk_mean, momentum"
            ),
        }
    }
}

impl fmt::Display for ReturnModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HistoricalMean => f.write_str("historical_mean"),
            Self::ShrunkMean => f.write_str("shrunk_mean"),
            Self::Momentum => f.write_str("momentum"),
        }
    }
}

/// Position and turnover limits, all as fractions of total capital except
/// `rebalance_budget`, which is a currency amount capping buys.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Constraints {
    pub min_position_pct: Option<f64>,
    pub max_position_pct: Option<f64>,
    /// Cap on `sum(|target - current|)`.
    pub max_turnover: Option<f64>,
    pub rebalance_budget: Option<f64>,
}

/// Calendar conventions and data-sufficiency thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OptimizeParams {
    pub trading_days_per_year: f64,
    pub days_per_year: f64,
    pub min_history_points: usize,
    pub min_overlap_points: usize,
    pub ewma_decay: f64,
}

impl Default for OptimizeParams {
    fn default() -> Self {
        Self {
            trading_days_per_year: 252.0,
            days_per_year: 365.0,
            min_history_points: 30,
            min_overlap_points: 5,
            ewma_decay: 0.94,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OptimizeRequest {
    pub method: OptimizeMethod,
    pub cov_model: CovModel,
    pub return_model: ReturnModel,
    /// Normalized symbols, in output order.
    pub universe: Vec<String>,
    /// Name reported for the benchmark curve.
    pub benchmark: String,
    pub constraints: Constraints,
}

/// Market data and holdings the optimizer reads.
#[derive(Debug, Clone, Copy)]
pub struct OptimizeInputs<'a> {
    pub price_series: &'a BTreeMap<String, Vec<PricePoint>>,
    pub benchmark: Option<&'a [PricePoint]>,
    /// Current share counts by symbol.
    pub shares: &'a BTreeMap<String, f64>,
    pub cash: f64,
    /// Lookback window for the price history.
    pub window: DateWindow,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum OptimizeError {
    #[error("No symbols to optimize")]
    EmptyUniverse,
    #[error("No symbols with usable price history")]
    NoUsableHistory,
    #[error("Only {dates} overlapping dates across the universe; at least {required} are needed")]
    NotEnoughOverlap { dates: usize, required: usize },
    #[error("Not enough return observations for optimization")]
    NotEnoughReturns,
}

/// Weights by symbol for the three allocations compared in the backtest.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationWeights {
    pub recommended: BTreeMap<String, f64>,
    pub current: BTreeMap<String, f64>,
    pub equal_weight: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Optimization {
    pub method: OptimizeMethod,
    pub goal: &'static str,
    /// Symbols that survived the history checks.
    pub universe: Vec<String>,
    /// First and last common price date.
    pub window: DateWindow,
    pub lookback_days: i64,
    pub benchmark: String,
    pub weights: AllocationWeights,
    pub trades: Vec<TradeSuggestion>,
    /// Keyed by `recommended`, `current`, `equal_weight` and (when it covers
    /// every date) `benchmark`.
    pub metrics: BTreeMap<String, CurveMetrics>,
    pub backtest: Vec<BacktestPoint>,
    /// Annualized, per the requested return model.
    pub expected_returns: BTreeMap<String, f64>,
    pub warnings: Vec<String>,
}

/// Prices of the usable universe on the dates every symbol shares.
#[derive(Debug, Clone)]
pub(crate) struct AlignedPrices {
    pub dates: Vec<NaiveDate>,
    pub symbols: Vec<String>,
    /// One row per date, one column per symbol.
    pub prices: DMatrix<f64>,
}

pub(crate) fn aligned_prices(
    price_series: &BTreeMap<String, Vec<PricePoint>>,
    universe: &[String],
    window: DateWindow,
    params: &OptimizeParams,
    warnings: &mut Vec<String>,
) -> Result<AlignedPrices, OptimizeError> {
    let mut by_symbol: Vec<(String, BTreeMap<NaiveDate, f64>)> = Vec::new();
    for symbol in universe {
        let points = price_series
            .get(symbol)
            .map(|series| filter_window(series, window))
            .unwrap_or_default();
        if points.len() < params.min_history_points {
            warnings.push(format!(
                "Insufficient price history for {symbol}; dropped from optimization universe."
            ));
            continue;
        }
        let prices = points.iter().map(|p| (p.date, p.value)).collect();
        by_symbol.push((symbol.clone(), prices));
    }

    let Some(((_, first), rest)) = by_symbol.split_first() else {
        return Err(OptimizeError::NoUsableHistory);
    };
    let dates: Vec<NaiveDate> = first
        .keys()
        .filter(|date| rest.iter().all(|(_, prices)| prices.contains_key(*date)))
        .copied()
        .collect();

    if dates.len() < params.min_history_points {
        warnings.push(
            "Limited overlapping price history across symbols; results may be unstable.".to_string(),
        );
    }
    if dates.len() < params.min_overlap_points {
        return Err(OptimizeError::NotEnoughOverlap {
            dates: dates.len(),
            required: params.min_overlap_points,
        });
    }

    let prices = DMatrix::from_fn(dates.len(), by_symbol.len(), |row, col| {
        by_symbol[col].1.get(&dates[row]).copied().unwrap_or_default()
    });
    Ok(AlignedPrices {
        dates,
        symbols: by_symbol.into_iter().map(|(symbol, _)| symbol).collect(),
        prices,
    })
}

/// Market-value weights of the held symbols. Falls back to equal weights
/// when nothing in the universe is held.
fn current_weights(
    symbols: &[String],
    shares: &BTreeMap<String, f64>,
    latest: &[Option<f64>],
) -> DVector<f64> {
    let values = DVector::from_fn(symbols.len(), |i, _| {
        let qty = shares.get(&symbols[i]).copied().unwrap_or_default();
        match latest[i] {
            Some(price) if qty > 0.0 => qty * price,
            _ => 0.0,
        }
    });
    let total = values.sum();
    if total > 0.0 && total.is_finite() {
        values / total
    } else {
        weights::equal_weights(symbols.len())
    }
}

fn keyed(symbols: &[String], values: &DVector<f64>) -> BTreeMap<String, f64> {
    symbols.iter().cloned().zip(values.iter().copied()).collect()
}

/// Suggest a long-only allocation for `request.universe`.
pub fn optimize(
    request: &OptimizeRequest,
    inputs: &OptimizeInputs<'_>,
    params: &OptimizeParams,
) -> Result<Optimization, OptimizeError> {
    if request.universe.is_empty() {
        return Err(OptimizeError::EmptyUniverse);
    }
    let mut warnings = Vec::new();
    let aligned = aligned_prices(
        inputs.price_series,
        &request.universe,
        inputs.window,
        params,
        &mut warnings,
    )?;

    let returns = covariance::returns_matrix(&aligned.prices);
    if returns.nrows() < 2 {
        return Err(OptimizeError::NotEnoughReturns);
    }
    let (Some(&first), Some(&last)) = (aligned.dates.first(), aligned.dates.last()) else {
        return Err(OptimizeError::NotEnoughReturns);
    };
    let span = DateWindow::new(first, last);

    debug!(
        method = %request.method,
        cov_model = %request.cov_model,
        symbols = aligned.symbols.len(),
        dates = aligned.dates.len(),
        window = %span,
        "Optimizing allocation"
    );

    let cov = covariance::estimate(request.cov_model, &returns, params.ewma_decay);
    let expected = covariance::expected_returns(
        &aligned.prices,
        &returns,
        request.return_model,
        params.trading_days_per_year,
    );

    let limits = &request.constraints;
    let mut target = weights::apply_weight_limits(
        &weights::optimize_weights(request.method, &cov),
        limits.min_position_pct,
        limits.max_position_pct,
    );

    let latest: Vec<Option<f64>> = aligned
        .symbols
        .iter()
        .map(|symbol| {
            inputs
                .price_series
                .get(symbol)
                .and_then(|series| value_as_of(series, inputs.window.end))
        })
        .collect();
    let current = current_weights(&aligned.symbols, inputs.shares, &latest);
    if let Some(max_turnover) = limits.max_turnover {
        target = weights::enforce_turnover(&target, &current, max_turnover);
    }
    let equal = weights::equal_weights(aligned.symbols.len());

    let equity: f64 = aligned
        .symbols
        .iter()
        .zip(&latest)
        .filter_map(|(symbol, price)| Some(inputs.shares.get(symbol)? * (*price)?))
        .sum();
    let total_capital = equity + inputs.cash.max(0.0);
    let trades = backtest::trade_suggestions(
        &aligned.symbols,
        &target,
        &current,
        &latest,
        total_capital,
        limits.rebalance_budget,
    );

    let benchmark = inputs.benchmark.filter(|series| !series.is_empty());
    if benchmark.is_none() {
        warnings.push(format!(
            "No price history for benchmark {}; overlay omitted.",
            request.benchmark
        ));
    }
    let (backtest, metrics) = backtest::backtest_curves(
        &aligned.dates,
        &returns,
        &[
            (backtest::RECOMMENDED, &target),
            (backtest::CURRENT, &current),
            (backtest::EQUAL_WEIGHT, &equal),
        ],
        benchmark,
        params,
    );

    Ok(Optimization {
        method: request.method,
        goal: request.method.goal(),
        window: span,
        lookback_days: span.span_days(),
        benchmark: request.benchmark.clone(),
        weights: AllocationWeights {
            recommended: keyed(&aligned.symbols, &target),
            current: keyed(&aligned.symbols, &current),
            equal_weight: keyed(&aligned.symbols, &equal),
        },
        trades,
        metrics,
        backtest,
        expected_returns: keyed(&aligned.symbols, &expected),
        universe: aligned.symbols,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    /// `len` daily prices starting at 100, moving by `step(i)` percent.
    fn series(len: usize, step: impl Fn(usize) -> f64) -> Vec<PricePoint> {
        let mut value = 100.0;
        (0..len)
            .map(|i| {
                if i > 0 {
                    value *= 1.0 + step(i) / 100.0;
                }
                PricePoint::new(start() + Duration::days(i as i64), value)
            })
            .collect()
    }

    fn full_window() -> DateWindow {
        DateWindow::new(start(), start() + Duration::days(365))
    }

    fn universe(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn request(method: OptimizeMethod, symbols: &[&str]) -> OptimizeRequest {
        OptimizeRequest {
            method,
            cov_model: CovModel::Shrinkage,
            return_model: ReturnModel::ShrunkMean,
            universe: universe(symbols),
            benchmark: "SPY".to_string(),
            constraints: Constraints::default(),
        }
    }

    fn market() -> BTreeMap<String, Vec<PricePoint>> {
        BTreeMap::from([
            // Calm
            ("BND".to_string(), series(60, |i| if i % 2 == 0 { 0.2 } else { -0.1 })),
            // Volatile
            ("TSLA".to_string(), series(60, |i| if i % 4 < 2 { 4.0 } else { -3.5 })),
            ("AAPL".to_string(), series(60, |i| if i % 3 == 0 { 1.5 } else { -0.5 })),
        ])
    }

    #[test]
    fn method_keys_round_trip_through_from_str() {
        for method in OptimizeMethod::ALL {
            assert_eq!(method.key().parse::<OptimizeMethod>().unwrap(), method);
        }
        assert_eq!("Risk-Parity".parse::<OptimizeMethod>().unwrap(), OptimizeMethod::RiskParity);
        assert!("black_litterman".parse::<OptimizeMethod>().is_err());
        assert!(!OptimizeMethod::EqualWeight.uses_covariance());
    }

    #[test]
    fn short_histories_are_dropped_with_a_warning() {
        let mut prices = market();
        prices.insert("NEW".to_string(), series(10, |_| 1.0));
        let mut warnings = Vec::new();
        let aligned = aligned_prices(
            &prices,
            &universe(&["AAPL", "NEW", "TSLA"]),
            full_window(),
            &OptimizeParams::default(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(aligned.symbols, vec!["AAPL", "TSLA"]);
        assert_eq!(aligned.prices.shape(), (60, 2));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("NEW"));
    }

    #[test]
    fn alignment_keeps_only_common_dates() {
        let mut prices = market();
        let tsla = prices.get_mut("TSLA").unwrap();
        tsla.retain(|p| p.date != start() + Duration::days(10));
        let mut warnings = Vec::new();
        let aligned = aligned_prices(
            &prices,
            &universe(&["AAPL", "TSLA"]),
            full_window(),
            &OptimizeParams::default(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(aligned.dates.len(), 59);
        assert!(!aligned.dates.contains(&(start() + Duration::days(10))));
        assert!(warnings.is_empty());
    }

    #[test]
    fn too_little_overlap_is_an_error() {
        let prices = BTreeMap::from([
            ("A".to_string(), series(40, |_| 1.0)),
            (
                "B".to_string(),
                series(40, |_| 1.0)
                    .into_iter()
                    .map(|p| PricePoint::new(p.date + Duration::days(37), p.value))
                    .collect(),
            ),
        ]);
        let mut warnings = Vec::new();
        let err = aligned_prices(
            &prices,
            &universe(&["A", "B"]),
            DateWindow::new(start(), start() + Duration::days(400)),
            &OptimizeParams::default(),
            &mut warnings,
        )
        .unwrap_err();
        assert_eq!(err, OptimizeError::NotEnoughOverlap { dates: 3, required: 5 });
        assert!(warnings[0].contains("Limited overlapping"));
    }

    #[test]
    fn no_usable_symbol_is_an_error() {
        let shares = BTreeMap::new();
        let prices = market();
        let inputs = OptimizeInputs {
            price_series: &prices,
            benchmark: None,
            shares: &shares,
            cash: 0.0,
            window: full_window(),
        };
        let err = optimize(&request(OptimizeMethod::Hrp, &["MSFT"]), &inputs, &OptimizeParams::default())
            .unwrap_err();
        assert_eq!(err, OptimizeError::NoUsableHistory);
        let err = optimize(&request(OptimizeMethod::Hrp, &[]), &inputs, &OptimizeParams::default())
            .unwrap_err();
        assert_eq!(err, OptimizeError::EmptyUniverse);
    }

    #[test]
    fn every_method_yields_long_only_weights_summing_to_one() {
        let prices = market();
        let shares = BTreeMap::from([("AAPL".to_string(), 10.0)]);
        let inputs = OptimizeInputs {
            price_series: &prices,
            benchmark: prices.get("AAPL").map(Vec::as_slice),
            shares: &shares,
            cash: 500.0,
            window: full_window(),
        };
        for method in OptimizeMethod::ALL {
            let result = optimize(
                &request(method, &["AAPL", "BND", "TSLA"]),
                &inputs,
                &OptimizeParams::default(),
            )
            .unwrap();
            let total: f64 = result.weights.recommended.values().sum();
            assert!((total - 1.0).abs() < 1e-9, "{method}: {total}");
            assert!(result.weights.recommended.values().all(|w| *w >= 0.0), "{method}");
            assert_eq!(result.backtest.len(), 60);
            assert_eq!(result.lookback_days, 59);
        }
    }

    #[test]
    fn risk_based_methods_favor_the_calm_asset() {
        let prices = market();
        let shares = BTreeMap::new();
        let inputs = OptimizeInputs {
            price_series: &prices,
            benchmark: None,
            shares: &shares,
            cash: 0.0,
            window: full_window(),
        };
        for method in [OptimizeMethod::InverseVol, OptimizeMethod::Gmv, OptimizeMethod::Hrp] {
            let result = optimize(&request(method, &["BND", "TSLA"]), &inputs, &OptimizeParams::default())
                .unwrap();
            let w = &result.weights.recommended;
            assert!(w["BND"] > w["TSLA"], "{method}: {w:?}");
        }
    }

    #[test]
    fn current_weights_follow_market_value() {
        let prices = market();
        let shares = BTreeMap::from([("AAPL".to_string(), 30.0), ("BND".to_string(), 10.0)]);
        let inputs = OptimizeInputs {
            price_series: &prices,
            benchmark: None,
            shares: &shares,
            cash: 0.0,
            window: full_window(),
        };
        let result = optimize(
            &request(OptimizeMethod::EqualWeight, &["AAPL", "BND", "TSLA"]),
            &inputs,
            &OptimizeParams::default(),
        )
        .unwrap();
        let aapl = prices["AAPL"].last().unwrap().value * 30.0;
        let bnd = prices["BND"].last().unwrap().value * 10.0;
        let current = &result.weights.current;
        assert!((current["AAPL"] - aapl / (aapl + bnd)).abs() < 1e-12);
        assert_eq!(current["TSLA"], 0.0);
        assert!(result.warnings.iter().any(|w| w.contains("benchmark SPY")));
        assert!(!result.metrics.contains_key("benchmark"));
    }

    #[test]
    fn turnover_cap_limits_distance_from_current() {
        let prices = market();
        let shares = BTreeMap::from([("BND".to_string(), 100.0)]);
        let mut req = request(OptimizeMethod::EqualWeight, &["AAPL", "BND", "TSLA"]);
        req.constraints.max_turnover = Some(0.2);
        let inputs = OptimizeInputs {
            price_series: &prices,
            benchmark: None,
            shares: &shares,
            cash: 0.0,
            window: full_window(),
        };
        let result = optimize(&req, &inputs, &OptimizeParams::default()).unwrap();
        let turnover: f64 = result
            .weights
            .recommended
            .iter()
            .map(|(symbol, w)| (w - result.weights.current[symbol]).abs())
            .sum();
        assert!(turnover <= 0.2 + 1e-9, "{turnover}");
        assert!(result.weights.recommended["BND"] > 0.8);
    }
}
