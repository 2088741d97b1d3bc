use std::collections::BTreeMap;

use crate::analytics::{compute_holding_performance, value_as_of};
use crate::import::PositionsPayload;
use crate::models::{DateWindow, HoldingSummary, PortfolioPoint, PositionSnapshot, PricePoint};

/// Marks every snapshot to market. Shares in a symbol with no price on or
/// before the snapshot date contribute nothing.
pub fn portfolio_series(
    positions: &[PositionSnapshot],
    price_history: &BTreeMap<String, Vec<PricePoint>>,
) -> Vec<PortfolioPoint> {
    positions
        .iter()
        .map(|snapshot| {
            let equity: f64 = snapshot
                .shares
                .iter()
                .filter_map(|(symbol, shares)| {
                    let series = price_history.get(symbol)?;
                    value_as_of(series, snapshot.date).map(|price| shares * price)
                })
                .sum();
            PortfolioPoint::new(snapshot.date, equity + snapshot.cash, equity, snapshot.cash)
        })
        .collect()
}

/// Holdings over the whole reconstructed timeline, one per symbol in the
/// final snapshot, sorted by symbol.
///
/// Descriptions and cost basis come from the positions import; a symbol
/// only seen in transactions has an empty description and no cost basis.
pub fn holdings_summary(
    import: &PositionsPayload,
    positions: &[PositionSnapshot],
    price_history: &BTreeMap<String, Vec<PricePoint>>,
) -> Vec<HoldingSummary> {
    let (Some(first), Some(last)) = (positions.first(), positions.last()) else {
        return Vec::new();
    };

    let descriptions = import.descriptions();
    let costs = import.cost_basis();
    let statics: Vec<HoldingSummary> = last
        .shares
        .keys()
        .map(|symbol| {
            let mut holding = HoldingSummary::new(
                symbol.clone(),
                descriptions.get(symbol).cloned().unwrap_or_default(),
            );
            holding.cost_basis = costs.get(symbol).copied();
            holding
        })
        .collect();

    let mut holdings = compute_holding_performance(
        &statics,
        positions,
        price_history,
        DateWindow::new(first.date, last.date),
    );
    holdings.sort_by(|a, b| a.symbol.cmp(&b.symbol));
    holdings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{AccountMetadata, PositionRow, RowType};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, day).unwrap()
    }

    fn snapshot(day: u32, shares: &[(&str, f64)], cash: f64) -> PositionSnapshot {
        PositionSnapshot::new(
            d(day),
            shares.iter().map(|(s, q)| (s.to_string(), *q)).collect(),
            cash,
        )
    }

    fn row(symbol: &str, description: &str, cost_basis: Option<i64>) -> PositionRow {
        PositionRow {
            symbol: symbol.to_string(),
            description: description.to_string(),
            quantity: None,
            price: None,
            price_change: None,
            price_change_pct: None,
            market_value: None,
            day_change: None,
            day_change_pct: None,
            cost_basis: cost_basis.map(Decimal::from),
            gain: None,
            gain_pct: None,
            reinvest: None,
            reinvest_capital_gains: None,
            security_type: None,
            row_type: RowType::Position,
        }
    }

    #[test]
    fn portfolio_marks_to_market_with_carried_prices() {
        let positions = vec![
            snapshot(1, &[("AAPL", 2.0), ("GHOST", 5.0)], 10.0),
            snapshot(2, &[("AAPL", 2.0), ("GHOST", 5.0)], 10.0),
            snapshot(3, &[("AAPL", 3.0), ("GHOST", 5.0)], 0.0),
        ];
        let history: BTreeMap<String, Vec<PricePoint>> = [(
            "AAPL".to_string(),
            vec![PricePoint::new(d(2), 100.0), PricePoint::new(d(3), 110.0)],
        )]
        .into_iter()
        .collect();

        let series = portfolio_series(&positions, &history);
        let values: Vec<f64> = series.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![10.0, 210.0, 330.0]);
        assert_eq!(series[2].equity, 330.0);
        assert_eq!(series[1].cash, 10.0);
    }

    #[test]
    fn holdings_take_metadata_from_import() {
        let import = PositionsPayload {
            metadata: AccountMetadata {
                header_line: "Unknown".to_string(),
                account_name: None,
                as_of: None,
            },
            rows: vec![row("AAPL", "APPLE INC", Some(150)), row("MSFT", "MICROSOFT", None)],
        };
        let positions = vec![
            snapshot(1, &[("AAPL", 1.0)], 0.0),
            snapshot(2, &[("AAPL", 2.0), ("MSFT", 1.0), ("TSLA", 1.0)], 0.0),
        ];
        let history: BTreeMap<String, Vec<PricePoint>> = [
            (
                "AAPL".to_string(),
                vec![PricePoint::new(d(1), 100.0), PricePoint::new(d(2), 120.0)],
            ),
            ("MSFT".to_string(), vec![PricePoint::new(d(2), 50.0)]),
        ]
        .into_iter()
        .collect();

        let holdings = holdings_summary(&import, &positions, &history);
        let symbols: Vec<&str> = holdings.iter().map(|h| h.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT", "TSLA"]);

        assert_eq!(holdings[0].description, "APPLE INC");
        assert_eq!(holdings[0].cost_basis, Some(150.0));
        assert_eq!(holdings[0].current_value, 240.0);
        assert_eq!(holdings[0].gain_abs, Some(140.0));
        assert_eq!(holdings[0].gain_pct, Some(1.4));

        assert_eq!(holdings[1].cost_basis, Some(0.0));
        assert_eq!(holdings[1].gain_pct, None);

        assert_eq!(holdings[2].description, "");
        assert_eq!(holdings[2].cost_basis, None);
        assert_eq!(holdings[2].current_value, 0.0);
    }

    #[test]
    fn no_snapshots_no_holdings() {
        let import = PositionsPayload {
            metadata: AccountMetadata {
                header_line: "Unknown".to_string(),
                account_name: None,
                as_of: None,
            },
            rows: Vec::new(),
        };
        assert!(holdings_summary(&import, &[], &BTreeMap::new()).is_empty());
    }
}
