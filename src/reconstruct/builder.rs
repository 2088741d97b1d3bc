use std::collections::BTreeSet;

use chrono::Duration;

use crate::clock::Clock;
use crate::config::ReconstructConfig;
use crate::import::PositionsPayload;
use crate::models::DateWindow;
use crate::payload::PerformancePayload;

use super::pricing::{
    fallback_prices_from_positions, fallback_prices_from_transactions, has_coverage,
    price_history_from_bars, BarsBySymbol,
};
use super::timeline::{baseline_positions, positions_timeline};
use super::transactions::Transaction;
use super::valuation::{holdings_summary, portfolio_series};
use super::ReconstructError;

/// Rebuilds a [`PerformancePayload`] from a positions import, the
/// transaction history and daily bars.
pub struct PerformanceBuilder<'a> {
    config: &'a ReconstructConfig,
    benchmarks: &'a [String],
    clock: &'a dyn Clock,
}

impl<'a> PerformanceBuilder<'a> {
    pub fn new(config: &'a ReconstructConfig, benchmarks: &'a [String], clock: &'a dyn Clock) -> Self {
        Self {
            config,
            benchmarks,
            clock,
        }
    }

    /// Day before the first transaction through the last one, cut off at
    /// the last settled market day.
    pub fn window(&self, txns: &[Transaction]) -> Result<DateWindow, ReconstructError> {
        let (Some(first), Some(last)) = (
            txns.iter().map(|t| t.date).min(),
            txns.iter().map(|t| t.date).max(),
        ) else {
            return Err(ReconstructError::NoTransactions);
        };
        let settled = self.clock.settled_date(self.config.market_data_delay());
        Ok(DateWindow::new(first - Duration::days(1), last.min(settled)))
    }

    pub fn build(
        &self,
        import: &PositionsPayload,
        txns: &[Transaction],
        bars: &BarsBySymbol,
    ) -> Result<PerformancePayload, ReconstructError> {
        let window = self.window(txns)?;

        let symbols: Vec<String> = import
            .position_symbols()
            .into_iter()
            .chain(txns.iter().filter_map(|t| t.symbol.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let baseline = baseline_positions(txns, &import.target_shares(), import.target_cash());
        let positions = positions_timeline(txns, &baseline, window);

        let mut warnings = Vec::new();
        if let (Some(start), Some(end)) = (
            window.start.and_hms_opt(23, 59, 59),
            window.end.and_hms_opt(0, 0, 0),
        ) {
            let (start, end) = (start.and_utc(), end.and_utc());
            let checked: BTreeSet<&String> = symbols.iter().chain(self.benchmarks).collect();
            for symbol in checked {
                if let Some(series) = bars.get(symbol).filter(|s| !s.is_empty()) {
                    if !has_coverage(series, start, end) {
                        warnings.push(format!("Partial market data for {symbol} in {window}."));
                    }
                }
            }
        }

        let mut fallback_prices = fallback_prices_from_positions(import);
        for (symbol, price) in fallback_prices_from_transactions(txns) {
            fallback_prices.entry(symbol).or_insert(price);
        }
        for benchmark in self.benchmarks {
            fallback_prices
                .entry(benchmark.clone())
                .or_insert(self.config.fallback_benchmark_price);
        }
        let price_history = price_history_from_bars(bars, &fallback_prices, window, &mut warnings);

        let portfolio = portfolio_series(&positions, &price_history);
        let benchmark_series = self
            .benchmarks
            .iter()
            .filter_map(|b| price_history.get(b).map(|s| (b.clone(), s.clone())))
            .collect();
        let holdings = holdings_summary(import, &positions, &price_history);

        tracing::info!(
            window = %window,
            symbols = symbols.len(),
            snapshots = positions.len(),
            warnings = warnings.len(),
            "reconstructed performance payload"
        );

        Ok(PerformancePayload {
            start_date: window.start,
            end_date: window.end,
            symbols,
            benchmarks: self.benchmarks.to_vec(),
            portfolio,
            benchmark_series,
            price_series: price_history,
            positions,
            holdings,
            warnings,
        })
    }
}
