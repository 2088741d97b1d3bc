//! Date-range presets like "3m", "1y" or "ytd" for picking a report window.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::models::DateWindow;

/// A lookback relative to the last available date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
    /// From January 1st of the end date's year.
    YearToDate,
    /// Everything available.
    All,
}

/// Parse a range string like "30d", "4w", "3m", "1y", "ytd", "all".
///
/// Supported units:
/// - `d` - days
/// - `w` - weeks
/// - `m` - calendar months
/// - `y` - calendar years
///
/// The input is case-insensitive and whitespace is trimmed.
///
/// # Examples
///
/// ```
/// use wealthwise::range::{parse_range, RangePreset};
///
/// assert_eq!(parse_range("30d").unwrap(), RangePreset::Days(30));
/// assert_eq!(parse_range("3M").unwrap(), RangePreset::Months(3));
/// assert_eq!(parse_range("ytd").unwrap(), RangePreset::YearToDate);
/// assert_eq!(parse_range("max").unwrap(), RangePreset::All);
/// ```
pub fn parse_range(s: &str) -> Result<RangePreset> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "ytd" => return Ok(RangePreset::YearToDate),
        "all" | "max" => return Ok(RangePreset::All),
        _ => {}
    }

    let Some(unit) = s.chars().last() else {
        anyhow::bail!("Range must not be empty");
    };
    let num: u32 = s[..s.len() - unit.len_utf8()]
        .parse()
        .with_context(|| format!("Invalid number in range: {s}"))?;
    if num == 0 {
        anyhow::bail!("Range must be at least 1 {unit}");
    }

    match unit {
        'd' => Ok(RangePreset::Days(num)),
        'w' => Ok(RangePreset::Weeks(num)),
        'm' => Ok(RangePreset::Months(num)),
        'y' => Ok(RangePreset::Years(num)),
        _ => anyhow::bail!("Range must end with d, w, m, or y, or be one of ytd, all"),
    }
}

impl FromStr for RangePreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_range(s)
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Days(n) => write!(f, "{n}d"),
            Self::Weeks(n) => write!(f, "{n}w"),
            Self::Months(n) => write!(f, "{n}m"),
            Self::Years(n) => write!(f, "{n}y"),
            Self::YearToDate => f.write_str("ytd"),
            Self::All => f.write_str("all"),
        }
    }
}

impl RangePreset {
    /// Window ending at `last` and reaching back by this preset, never
    /// starting before `first`.
    pub fn resolve(&self, first: NaiveDate, last: NaiveDate) -> DateWindow {
        let start = match self {
            Self::Days(n) => last.checked_sub_signed(Duration::days(i64::from(*n))),
            Self::Weeks(n) => last.checked_sub_signed(Duration::weeks(i64::from(*n))),
            Self::Months(n) => last.checked_sub_months(Months::new(*n)),
            Self::Years(n) => n
                .checked_mul(12)
                .and_then(|months| last.checked_sub_months(Months::new(months))),
            Self::YearToDate => NaiveDate::from_ymd_opt(last.year(), 1, 1),
            Self::All => Some(first),
        };
        let start = start.map_or(first, |s| s.max(first));
        DateWindow::new(start, last)
    }
}

impl Serialize for RangePreset {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RangePreset {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_range(&s).map_err(de::Error::custom)
    }
}
