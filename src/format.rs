//! Rendering of computed values for people.
//!
//! A value that could not be computed renders as the configured placeholder,
//! never as `0` or `NaN`.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::config::DisplayConfig;
use crate::models::Metrics;

fn round_half_away(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::try_from(value).ok()
}

fn group_int_digits(int_part: &str) -> String {
    // Insert commas every 3 digits.
    let mut out = String::with_capacity(int_part.len() + int_part.len() / 3);
    let len = int_part.len();
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len.saturating_sub(i + 1);
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

fn pad_fraction_to_dp(s: &str, dp: u32) -> String {
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if dp == 0 {
        return int_part.to_string();
    }

    let mut frac: String = frac_part.chars().take(dp as usize).collect();
    while frac.len() < dp as usize {
        frac.push('0');
    }
    format!("{int_part}.{frac}")
}

fn group_number_string(s: &str) -> String {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };
    let grouped = group_int_digits(int_part);
    match frac_part {
        Some(f) if !f.is_empty() => format!("{grouped}.{f}"),
        _ => grouped,
    }
}

/// Fixed-precision decimal rendering (half away from zero), always padded to
/// `dp` places.
fn fixed(value: f64, dp: u32) -> Option<String> {
    let rounded = round_half_away(to_decimal(value)?, dp);
    Some(pad_fraction_to_dp(&rounded.normalize().to_string(), dp))
}

/// A fraction rendered as a percentage: `0.1234` → `12.34%`.
pub fn format_percent(value: Option<f64>, decimals: u32, placeholder: &str) -> String {
    value
        .and_then(|v| fixed(v * 100.0, decimals))
        .map(|s| format!("{s}%"))
        .unwrap_or_else(|| placeholder.to_string())
}

/// A unitless ratio such as Sharpe or beta.
pub fn format_ratio(value: Option<f64>, decimals: u32, placeholder: &str) -> String {
    value
        .and_then(|v| fixed(v, decimals))
        .unwrap_or_else(|| placeholder.to_string())
}

/// Format a currency amount for human display.
///
/// Options (from [`DisplayConfig`]):
/// - `currency_decimals`: rounding precision (half away from zero)
/// - `currency_grouping`: enable thousands separators (`,`)
/// - `currency_symbol`: optional prefix (e.g. `$`)
/// - `currency_fixed_decimals`: pad/truncate to exactly `currency_decimals`
pub fn format_currency(value: Option<f64>, display: &DisplayConfig) -> String {
    let Some(value) = value.and_then(to_decimal) else {
        return display.placeholder.clone();
    };

    let rounded = match display.currency_decimals {
        Some(dp) => round_half_away(value, dp),
        None => value,
    };

    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let mut s = rounded.abs().normalize().to_string();
    if display.currency_fixed_decimals {
        if let Some(dp) = display.currency_decimals {
            s = pad_fraction_to_dp(&s, dp);
        }
    }
    if display.currency_grouping {
        s = group_number_string(&s);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if let Some(sym) = &display.currency_symbol {
        out.push_str(sym);
    }
    out.push_str(&s);
    out
}

/// [`Metrics`] rendered field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsDisplay {
    pub total_return: String,
    pub total_abs: String,
    pub annualized: String,
    pub volatility: String,
    pub max_drawdown: String,
    pub sharpe: String,
    pub beta: String,
    pub correlation: String,
}

impl MetricsDisplay {
    pub fn new(metrics: &Metrics, display: &DisplayConfig) -> Self {
        let pct = |v: Option<f64>| format_percent(v, display.percent_decimals, &display.placeholder);
        let ratio = |v: Option<f64>| format_ratio(v, display.ratio_decimals, &display.placeholder);
        Self {
            total_return: pct(metrics.total_return),
            total_abs: format_currency(metrics.total_abs, display),
            annualized: pct(metrics.annualized),
            volatility: pct(metrics.volatility),
            max_drawdown: pct(metrics.max_drawdown),
            sharpe: ratio(metrics.sharpe),
            beta: ratio(metrics.beta),
            correlation: ratio(metrics.correlation),
        }
    }

    /// Label/value pairs in dashboard order.
    pub fn rows(&self) -> [(&'static str, &str); 8] {
        [
            ("Total return", &self.total_return),
            ("Total change", &self.total_abs),
            ("Annualized", &self.annualized),
            ("Volatility", &self.volatility),
            ("Max drawdown", &self.max_drawdown),
            ("Sharpe", &self.sharpe),
            ("Beta", &self.beta),
            ("Correlation", &self.correlation),
        ]
    }
}
