use serde::{Deserialize, Serialize};

/// Per-symbol performance over a window.
///
/// `symbol`, `description` and `cost_basis` are static facts from the
/// import; the rest is recomputed for every window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shares: f64,
    #[serde(default)]
    pub current_value: f64,
    #[serde(default)]
    pub cost_basis: Option<f64>,
    #[serde(default)]
    pub gain_abs: Option<f64>,
    #[serde(default)]
    pub gain_pct: Option<f64>,
}

impl HoldingSummary {
    /// A holding with only its static fields filled in.
    pub fn new(symbol: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            description: description.into(),
            shares: 0.0,
            current_value: 0.0,
            cost_basis: None,
            gain_abs: None,
            gain_pct: None,
        }
    }

    pub fn with_cost_basis(mut self, cost_basis: f64) -> Self {
        self.cost_basis = Some(cost_basis);
        self
    }
}
