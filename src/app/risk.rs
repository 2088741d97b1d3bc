use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;

use crate::analytics::risk::{
    herfindahl_index, market_risk, scenario_impacts, top_positions, weights_from_positions,
};
use crate::config::Config;
use crate::models::{DateWindow, PricePoint, Symbol};
use crate::reconstruct::price_history_from_bars;

use super::import::{read_bars, read_positions};
use super::types::RiskOutput;

/// Concentration, stress scenarios and (with bars) market risk of the
/// positions in an export.
pub fn risk_report(config: &Config, positions_csv: &Path, bars_json: Option<&Path>) -> Result<RiskOutput> {
    let positions = read_positions(positions_csv)?;
    let mut warnings = Vec::new();

    let mut values: Vec<(Symbol, f64)> = Vec::new();
    for (symbol, value) in positions.market_values() {
        match Symbol::parse(&symbol) {
            Ok(symbol) => values.push((symbol, value)),
            Err(e) => warnings.push(format!("Skipping position {symbol:?}: {e}")),
        }
    }
    let portfolio_value: f64 = values.iter().map(|(_, v)| v.max(0.0)).sum();
    let weights = weights_from_positions(&values);

    let bars = read_bars(bars_json)?;
    let dates = bars
        .values()
        .flatten()
        .map(|bar| bar.timestamp.date_naive());
    let market = match (dates.clone().min(), dates.max()) {
        (Some(start), Some(end)) => {
            let history: BTreeMap<String, Vec<PricePoint>> = price_history_from_bars(
                &bars,
                &BTreeMap::new(),
                DateWindow::new(start, end),
                &mut warnings,
            );
            let params = config.analytics.metric_params();
            let benchmark = config
                .analytics
                .benchmarks
                .iter()
                .find(|b| history.contains_key(b.as_str()));
            let risk = benchmark.and_then(|b| market_risk(&history, &weights, b, &params));
            if risk.is_none() {
                warnings.push("Not enough overlapping price history for market risk.".to_string());
            }
            risk
        }
        _ => None,
    };

    Ok(RiskOutput {
        portfolio_value,
        herfindahl_index: herfindahl_index(&weights),
        top_positions: top_positions(&weights, config.reconstruct.top_positions),
        scenarios: scenario_impacts(portfolio_value, &weights, &config.reconstruct.scenario_shocks),
        market,
        warnings,
    })
}
