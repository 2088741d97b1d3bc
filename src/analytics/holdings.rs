use std::collections::BTreeMap;

use crate::models::{DateWindow, HoldingSummary, PositionSnapshot, PricePoint};

use super::window::{point_as_of, value_as_of};

/// Per-symbol value and gain over `window`.
///
/// Shares come from the position snapshot in force at each window edge
/// (falling back to the last snapshot when none exists at or before the
/// end). Prices are carried forward from each symbol's series; a missing
/// start price falls back to the end price so the holding shows no gain
/// rather than a gain against zero. Output is sorted by current value,
/// largest first.
pub fn compute_holding_performance(
    holdings: &[HoldingSummary],
    positions: &[PositionSnapshot],
    price_series: &BTreeMap<String, Vec<PricePoint>>,
    window: DateWindow,
) -> Vec<HoldingSummary> {
    let start_snapshot = point_as_of(positions, window.start);
    let end_snapshot = point_as_of(positions, window.end).or(positions.last());

    let mut out: Vec<HoldingSummary> = holdings
        .iter()
        .map(|holding| {
            let symbol = holding.symbol.as_str();
            let start_shares = start_snapshot.map_or(0.0, |s| s.shares_of(symbol));
            let end_shares = end_snapshot.map_or(0.0, |s| s.shares_of(symbol));

            let series = price_series.get(symbol).map(Vec::as_slice).unwrap_or(&[]);
            let end_price = value_as_of(series, window.end);
            let start_price = value_as_of(series, window.start).or(end_price);

            let start_value = start_shares * start_price.unwrap_or(0.0);
            let end_value = end_shares * end_price.unwrap_or(0.0);
            let gain_abs = end_value - start_value;
            let gain_pct = (start_value > 0.0).then(|| gain_abs / start_value);

            HoldingSummary {
                symbol: holding.symbol.clone(),
                description: holding.description.clone(),
                shares: end_shares,
                current_value: end_value,
                cost_basis: holding.cost_basis,
                gain_abs: Some(gain_abs),
                gain_pct,
            }
        })
        .collect();

    out.sort_by(|a, b| b.current_value.total_cmp(&a.current_value));
    out
}
