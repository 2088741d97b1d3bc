mod holding;
mod metrics;
mod position;
mod series;
mod symbol;

pub use holding::HoldingSummary;
pub use metrics::{Metrics, RelativeMetrics};
pub use position::PositionSnapshot;
pub use series::{DateWindow, Dated, PortfolioPoint, PricePoint, Valued};
pub use symbol::{Symbol, SymbolError};
