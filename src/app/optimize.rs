use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::analytics::optimize::{
    optimize, Constraints, CovModel, MethodInfo, OptimizeInputs, OptimizeMethod, OptimizeRequest,
    ReturnModel,
};
use crate::analytics::point_as_of;
use crate::config::Config;
use crate::models::{Dated, Symbol};
use crate::payload::PerformancePayload;
use crate::range::RangePreset;

use super::types::OptimizeOutput;

/// Optimizer settings as given on the command line. Unset fields fall back
/// to the `[optimize]` config section.
#[derive(Debug, Clone, Default)]
pub struct OptimizeArgs {
    pub end: Option<NaiveDate>,
    pub lookback: Option<RangePreset>,
    pub method: Option<OptimizeMethod>,
    pub cov_model: Option<CovModel>,
    pub return_model: Option<ReturnModel>,
    pub benchmark: Option<String>,
    /// Overrides the held symbols.
    pub universe: Vec<String>,
    pub constraints: Constraints,
}

pub fn optimization_methods() -> Vec<MethodInfo> {
    OptimizeMethod::ALL.into_iter().map(OptimizeMethod::info).collect()
}

fn normalized(symbols: impl IntoIterator<Item = impl AsRef<str>>) -> Result<Vec<String>> {
    let mut unique = BTreeSet::new();
    for symbol in symbols {
        let symbol = Symbol::parse(symbol.as_ref())?;
        unique.insert(String::from(symbol));
    }
    Ok(unique.into_iter().collect())
}

/// Suggest an allocation for the payload's holdings as of the last position
/// date (or `--end`).
///
/// The universe is `args.universe`, else the symbols held on that date,
/// else the payload's symbol list. The benchmark curve is looked up in the
/// benchmark series first and the price series second.
pub fn optimize_portfolio(
    payload: &PerformancePayload,
    config: &Config,
    args: &OptimizeArgs,
) -> Result<OptimizeOutput> {
    let settings = &config.optimize;
    let end = args
        .end
        .or_else(|| payload.positions.last().map(Dated::date))
        .or_else(|| payload.portfolio.last().map(Dated::date))
        .unwrap_or(payload.end_date);
    let window = args
        .lookback
        .unwrap_or(settings.lookback)
        .resolve(payload.start_date, end);
    if window.is_inverted() {
        anyhow::bail!(
            "End date {end} is before the payload starts ({})",
            payload.start_date
        );
    }

    let snapshot = point_as_of(&payload.positions, end);
    let shares: BTreeMap<String, f64> = snapshot
        .map(|s| {
            s.shares
                .iter()
                .filter_map(|(symbol, qty)| Some((String::from(Symbol::parse(symbol).ok()?), *qty)))
                .collect()
        })
        .unwrap_or_default();
    let cash = snapshot
        .map(|s| s.cash)
        .or_else(|| point_as_of(&payload.portfolio, end).map(|p| p.cash))
        .unwrap_or_default();

    let universe = if !args.universe.is_empty() {
        normalized(&args.universe).context("Invalid --universe symbol")?
    } else {
        let held: Vec<&String> = shares
            .iter()
            .filter(|(_, qty)| **qty > 0.0)
            .map(|(symbol, _)| symbol)
            .collect();
        if held.is_empty() {
            normalized(payload.symbols.iter().filter(|s| !s.trim().is_empty()))?
        } else {
            normalized(held)?
        }
    };

    let mut warnings = payload.warnings.clone();
    let benchmark = match &args.benchmark {
        Some(requested) => String::from(Symbol::parse(requested).context("Invalid --benchmark")?),
        None => config
            .analytics
            .benchmarks
            .first()
            .cloned()
            .unwrap_or_else(|| "SPY".to_string()),
    };
    if !config.analytics.benchmarks.contains(&benchmark) {
        warnings.push(format!(
            "Benchmark {benchmark} not in defaults ({}).",
            config.analytics.benchmarks.join(", ")
        ));
    }
    let benchmark_series = payload
        .benchmark_series
        .get(&benchmark)
        .or_else(|| payload.price_series.get(&benchmark))
        .map(Vec::as_slice);

    let request = OptimizeRequest {
        method: args.method.unwrap_or(settings.method),
        cov_model: args.cov_model.unwrap_or(settings.cov_model),
        return_model: args.return_model.unwrap_or(settings.return_model),
        universe,
        benchmark,
        constraints: args.constraints,
    };
    let inputs = OptimizeInputs {
        price_series: &payload.price_series,
        benchmark: benchmark_series,
        shares: &shares,
        cash,
        window,
    };

    tracing::debug!(
        method = %request.method,
        universe = request.universe.len(),
        window = %window,
        "Running optimization"
    );
    let mut result = optimize(&request, &inputs, &settings.params(&config.analytics))
        .with_context(|| format!("Optimization over {window} failed"))?;
    warnings.append(&mut result.warnings);
    result.warnings = warnings;

    Ok(OptimizeOutput {
        result,
        covariance_model: request.cov_model,
        return_model: request.return_model,
        constraints: request.constraints,
    })
}
