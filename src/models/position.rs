use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Dated;

/// Holdings as of a date.
///
/// Snapshots are sparse: they exist where something changed, not for every
/// calendar day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PositionSnapshot {
    pub date: NaiveDate,
    pub shares: BTreeMap<String, f64>,
    pub cash: f64,
}

impl PositionSnapshot {
    pub fn new(date: NaiveDate, shares: BTreeMap<String, f64>, cash: f64) -> Self {
        Self { date, shares, cash }
    }

    /// Quantity held for `symbol`, zero when the symbol is not in the snapshot.
    pub fn shares_of(&self, symbol: &str) -> f64 {
        self.shares.get(symbol).copied().unwrap_or(0.0)
    }
}

impl Dated for PositionSnapshot {
    fn date(&self) -> NaiveDate {
        self.date
    }
}
