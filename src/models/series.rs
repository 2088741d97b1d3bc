use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Anything that sits on a calendar-day axis.
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

/// A dated sample carrying a single numeric mark.
pub trait Valued: Dated {
    fn value(&self) -> f64;
}

/// One sample of a price or level series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

impl Dated for PricePoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Valued for PricePoint {
    fn value(&self) -> f64 {
        self.value
    }
}

/// A portfolio mark with its equity/cash split.
///
/// `value` is authoritative; `equity + cash` is informational and need not
/// add up to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub equity: f64,
    pub cash: f64,
}

impl PortfolioPoint {
    pub fn new(date: NaiveDate, value: f64, equity: f64, cash: f64) -> Self {
        Self {
            date,
            value,
            equity,
            cash,
        }
    }

    /// A point where the whole value is equity.
    pub fn from_value(date: NaiveDate, value: f64) -> Self {
        Self::new(date, value, value, 0.0)
    }
}

impl Dated for PortfolioPoint {
    fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Valued for PortfolioPoint {
    fn value(&self) -> f64 {
        self.value
    }
}

/// Inclusive `[start, end]` calendar window.
///
/// Not validated: an inverted window is legal and simply selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Calendar days between `start` and `end` (negative when inverted).
    pub fn span_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}
