//! Brokerage "Positions" CSV export.
//!
//! The export looks like:
//!
//! ```text
//! "Positions for account Individual ...123 as of 10:02 AM ET, 2025/01/31"
//!
//! "Symbol","Description","Qty (Quantity)","Price",...,"Security Type",
//! "AAPL","APPLE INC","10","$190.00",...,"Equity",
//! "Cash & Cash Investments","--","--","--",...,"$1,234.56",...
//! "Account Total","--","--","--",...
//! ```
//!
//! Numeric cells may be wrapped in `="..."`, carry `$`, `,` and `%`, or use
//! `(x)` for negatives. `--`, `N/A` and empty cells are missing values.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;

use csv::ReaderBuilder;
use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const EXPECTED_HEADER: [&str; 15] = [
    "Symbol",
    "Description",
    "Qty (Quantity)",
    "Price",
    "Price Chng $ (Price Change $)",
    "Price Chng % (Price Change %)",
    "Mkt Val (Market Value)",
    "Day Chng $ (Day Change $)",
    "Day Chng % (Day Change %)",
    "Cost Basis",
    "Gain $ (Gain/Loss $)",
    "Gain % (Gain/Loss %)",
    "Reinvest?",
    "Reinvest Capital Gains?",
    "Security Type",
];

const METADATA_PREFIX: &str = "Positions for account";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not find CSV header row")]
    MissingHeader,

    #[error("CSV header does not match expected positions format: {found:?}")]
    HeaderMismatch { found: Vec<String> },

    #[error("could not parse {column} from '{value}' on line {line}")]
    Number {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowType {
    Position,
    Cash,
    Summary,
}

impl RowType {
    fn classify(symbol: &str) -> Self {
        let lower = symbol.to_lowercase();
        if lower.contains("account total") {
            RowType::Summary
        } else if lower.contains("cash") {
            RowType::Cash
        } else {
            RowType::Position
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountMetadata {
    pub header_line: String,
    pub account_name: Option<String>,
    pub as_of: Option<String>,
}

impl AccountMetadata {
    fn parse(line: Option<&str>) -> Self {
        static RE: OnceLock<Option<Regex>> = OnceLock::new();
        let Some(line) = line else {
            return Self {
                header_line: "Unknown".to_string(),
                account_name: None,
                as_of: None,
            };
        };
        let re = RE.get_or_init(|| {
            Regex::new(r"^Positions for account (?P<account>.+?) as of (?P<as_of>.+)").ok()
        });
        let caps = re.as_ref().and_then(|re| re.captures(line));
        Self {
            header_line: line.trim().to_string(),
            account_name: caps
                .as_ref()
                .and_then(|c| c.name("account"))
                .map(|m| m.as_str().trim().to_string()),
            as_of: caps
                .as_ref()
                .and_then(|c| c.name("as_of"))
                .map(|m| m.as_str().trim().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRow {
    pub symbol: String,
    pub description: String,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub price_change: Option<Decimal>,
    pub price_change_pct: Option<Decimal>,
    pub market_value: Option<Decimal>,
    pub day_change: Option<Decimal>,
    pub day_change_pct: Option<Decimal>,
    pub cost_basis: Option<Decimal>,
    pub gain: Option<Decimal>,
    pub gain_pct: Option<Decimal>,
    pub reinvest: Option<String>,
    pub reinvest_capital_gains: Option<String>,
    pub security_type: Option<String>,
    pub row_type: RowType,
}

impl PositionRow {
    /// Upper-cased symbol of a position row; `None` for cash/summary rows
    /// and blank symbols.
    pub fn position_symbol(&self) -> Option<String> {
        if self.row_type != RowType::Position {
            return None;
        }
        let sym = self.symbol.trim().to_uppercase();
        (!sym.is_empty()).then_some(sym)
    }
}

/// A parsed positions export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionsPayload {
    pub metadata: AccountMetadata,
    pub rows: Vec<PositionRow>,
}

impl PositionsPayload {
    pub fn positions(&self) -> impl Iterator<Item = &PositionRow> {
        self.rows.iter().filter(|r| r.row_type == RowType::Position)
    }

    /// Position symbols in file order, deduplicated.
    pub fn position_symbols(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for sym in self.positions().filter_map(PositionRow::position_symbol) {
            if !out.contains(&sym) {
                out.push(sym);
            }
        }
        out
    }

    /// Shares held per symbol at export time. Missing quantities count as 0.
    pub fn target_shares(&self) -> BTreeMap<String, Decimal> {
        self.positions()
            .filter_map(|row| {
                row.position_symbol()
                    .map(|sym| (sym, row.quantity.unwrap_or(Decimal::ZERO)))
            })
            .collect()
    }

    /// Market value of the first cash row, or 0.
    pub fn target_cash(&self) -> Decimal {
        self.rows
            .iter()
            .filter(|r| r.row_type == RowType::Cash)
            .find_map(|r| r.market_value)
            .unwrap_or(Decimal::ZERO)
    }

    /// Market value per position symbol, where present.
    pub fn market_values(&self) -> BTreeMap<String, f64> {
        self.positions()
            .filter_map(|row| {
                let value = row.market_value?.to_f64()?;
                row.position_symbol().map(|sym| (sym, value))
            })
            .collect()
    }

    /// Cost basis per position symbol; rows without one map to 0.
    pub fn cost_basis(&self) -> BTreeMap<String, f64> {
        self.positions()
            .filter_map(|row| {
                let cost = row.cost_basis.and_then(|c| c.to_f64()).unwrap_or(0.0);
                row.position_symbol().map(|sym| (sym, cost))
            })
            .collect()
    }

    /// First description seen per position symbol.
    pub fn descriptions(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for row in self.positions() {
            if let Some(sym) = row.position_symbol() {
                out.entry(sym).or_insert_with(|| row.description.clone());
            }
        }
        out
    }
}

fn strip_bom(value: &str) -> &str {
    value.trim_start_matches('\u{feff}')
}

/// Strip spreadsheet quoting such as `="$1.23"`.
fn clean_value(raw: &str) -> String {
    let mut value = strip_bom(raw).trim();
    if let Some(rest) = value.strip_prefix("=\"") {
        value = rest;
    }
    if let Some(rest) = value.strip_suffix('"') {
        value = rest;
    }
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value = &value[1..value.len() - 1];
    }
    value.trim().to_string()
}

fn normalize_numeric(value: &str) -> String {
    let value = value.replace(['$', ','], "");
    let value = value.trim();
    match value
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => format!("-{inner}"),
        None => value.to_string(),
    }
}

struct Cells<'a> {
    line: u64,
    cells: &'a [String],
}

impl Cells<'_> {
    fn text(&self, idx: usize) -> String {
        clean_value(&self.cells[idx])
    }

    fn optional_text(&self, idx: usize) -> Option<String> {
        let value = self.text(idx);
        (!value.is_empty()).then_some(value)
    }

    fn parse(&self, idx: usize, token: &str) -> Result<Decimal, ImportError> {
        Decimal::from_str(token)
            .or_else(|_| Decimal::from_scientific(token))
            .map_err(|_| ImportError::Number {
                line: self.line,
                column: EXPECTED_HEADER[idx],
                value: self.cells[idx].clone(),
            })
    }

    fn decimal(&self, idx: usize) -> Result<Option<Decimal>, ImportError> {
        let value = self.text(idx);
        if matches!(value.as_str(), "" | "--" | "N/A") {
            return Ok(None);
        }
        self.parse(idx, &normalize_numeric(&value)).map(Some)
    }

    fn percent(&self, idx: usize) -> Result<Option<Decimal>, ImportError> {
        let value = self.text(idx);
        if matches!(value.as_str(), "" | "--" | "N/A") {
            return Ok(None);
        }
        self.parse(idx, &normalize_numeric(&value.replace('%', "")))
            .map(Some)
    }

    fn quantity(&self, idx: usize) -> Result<Option<Decimal>, ImportError> {
        let value = self.text(idx);
        if matches!(value.as_str(), "" | "--") {
            return Ok(None);
        }
        self.parse(idx, &value.replace(',', "")).map(Some)
    }

    fn row(&self) -> Result<PositionRow, ImportError> {
        let symbol = self.text(0);
        Ok(PositionRow {
            row_type: RowType::classify(&symbol),
            description: self.text(1),
            quantity: self.quantity(2)?,
            price: self.decimal(3)?,
            price_change: self.decimal(4)?,
            price_change_pct: self.percent(5)?,
            market_value: self.decimal(6)?,
            day_change: self.decimal(7)?,
            day_change_pct: self.percent(8)?,
            cost_basis: self.decimal(9)?,
            gain: self.decimal(10)?,
            gain_pct: self.percent(11)?,
            reinvest: self.optional_text(12),
            reinvest_capital_gains: self.optional_text(13),
            security_type: self.optional_text(14),
            symbol,
        })
    }
}

/// Parse a positions export.
///
/// Rows before the header are skipped except the `Positions for account`
/// metadata line. Data rows are padded or truncated to the expected width.
pub fn parse_positions_csv(text: &str) -> Result<PositionsPayload, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(strip_bom(text).as_bytes());

    let mut metadata_line: Option<String> = None;
    let mut header_seen = false;
    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        if !header_seen {
            let first = strip_bom(&cells[0]);
            if first.starts_with(METADATA_PREFIX) {
                metadata_line = Some(first.to_string());
                continue;
            }
            if first.trim() == "Symbol" {
                let mut header: Vec<String> =
                    cells.iter().map(|c| strip_bom(c).to_string()).collect();
                while header.last().is_some_and(|c| c.trim().is_empty()) {
                    header.pop();
                }
                if header != EXPECTED_HEADER {
                    return Err(ImportError::HeaderMismatch { found: header });
                }
                header_seen = true;
            }
            continue;
        }

        cells.resize(EXPECTED_HEADER.len(), String::new());
        rows.push(Cells { line, cells: &cells }.row()?);
    }

    if !header_seen {
        return Err(ImportError::MissingHeader);
    }

    tracing::debug!(rows = rows.len(), "parsed positions export");
    Ok(PositionsPayload {
        metadata: AccountMetadata::parse(metadata_line.as_deref()),
        rows,
    })
}
