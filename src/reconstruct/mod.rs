//! Rebuilding performance history from brokerage exports.
//!
//! Given the current positions and the transaction history, replay the
//! history backwards to a starting position, then forwards day by day, and
//! mark every day to market with the supplied bars.

mod builder;
mod pricing;
mod timeline;
mod transactions;
mod valuation;

pub use builder::PerformanceBuilder;
pub use pricing::{
    fallback_prices_from_positions, fallback_prices_from_transactions, has_coverage, load_bars,
    merge_bars, price_history_from_bars, Bar, BarsBySymbol,
};
pub use timeline::{action_delta, baseline_positions, positions_timeline, Baseline};
pub use transactions::{
    parse_lenient_date, parse_lenient_decimal, parse_transactions, Action, Transaction,
};
pub use valuation::{holdings_summary, portfolio_series};

#[derive(Debug, thiserror::Error)]
pub enum ReconstructError {
    #[error("Invalid transactions export: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("No transactions could be parsed")]
    NoTransactions,
}
