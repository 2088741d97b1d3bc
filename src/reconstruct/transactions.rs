//! Brokerage transaction history export (`BrokerageTransactions` JSON).
//!
//! Exports are loosely typed: keys come in two casings, numbers arrive as
//! strings such as `"$1,234.50"` or `"(12.00)"`, and dates may be embedded in
//! text like `"01/31/2025 as of 01/30/2025"`. Parsing never rejects a row;
//! unreadable fields degrade to zero or to today's date.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ReconstructError;

/// How a transaction moves shares and cash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Buy,
    Sell,
    /// Dividends and interest: cash only.
    Income,
    Transfer,
    Other,
}

impl Action {
    pub fn classify(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        match upper.as_str() {
            "BUY" => Action::Buy,
            "SELL" => Action::Sell,
            _ if upper.contains("DIVIDEND") || upper.contains("INTEREST") => Action::Income,
            _ if upper.contains("TRANSFER") => Action::Transfer,
            _ => Action::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Upper-cased action text as exported.
    pub action_text: String,
    pub action: Action,
    pub symbol: Option<String>,
    pub quantity: Decimal,
    pub price: Decimal,
    pub amount: Decimal,
}

/// First non-empty value among `keys`, with numbers rendered as text.
fn field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match item.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Best-effort date parsing for brokerage exports.
///
/// Accepts `YYYY-MM-DD`, `MM/DD/YYYY`, `MM-DD-YYYY` and two-digit years
/// (taken as 20xx), anywhere in the text. Anything else is `today`.
pub fn parse_lenient_date(raw: &str, today: NaiveDate) -> NaiveDate {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{2,4})").ok()
    });

    let text = raw.to_lowercase().replace("as of", " ");
    let Some(token) = re
        .as_ref()
        .and_then(|re| re.find(&text))
        .map(|m| m.as_str().replace('-', "/"))
    else {
        return today;
    };

    let parts: Vec<&str> = token.split('/').collect();
    let [a, b, c] = parts.as_slice() else {
        return today;
    };
    let parsed = if a.len() == 4 {
        match (a.parse::<i32>(), b.parse::<u32>(), c.parse::<u32>()) {
            (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
            _ => None,
        }
    } else {
        match (c.parse::<i32>(), a.parse::<u32>(), b.parse::<u32>()) {
            (Ok(y), Ok(m), Ok(d)) => {
                let y = if y < 100 { y + 2000 } else { y };
                NaiveDate::from_ymd_opt(y, m, d)
            }
            _ => None,
        }
    };
    parsed.unwrap_or(today)
}

/// Best-effort amount parsing: `$` and `,` stripped, `(x)` is negative,
/// blanks, `--` and garbage are zero.
pub fn parse_lenient_decimal(raw: &str) -> Decimal {
    let value = raw.replace(['$', ','], "");
    let value = value.trim();
    let value = match value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => format!("-{inner}"),
        None => value.to_string(),
    };
    if value.is_empty() || value == "--" {
        return Decimal::ZERO;
    }
    Decimal::from_str(&value)
        .or_else(|_| Decimal::from_scientific(&value))
        .unwrap_or(Decimal::ZERO)
}

fn parse_item(item: &Value, today: NaiveDate) -> Transaction {
    let action_text = field(item, &["Action", "action"])
        .unwrap_or_default()
        .trim()
        .to_uppercase();
    let symbol = field(item, &["Symbol"])
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    let decimal = |keys: &[&str]| {
        field(item, keys)
            .map(|s| parse_lenient_decimal(&s))
            .unwrap_or(Decimal::ZERO)
    };

    Transaction {
        date: parse_lenient_date(&field(item, &["Date", "date"]).unwrap_or_default(), today),
        action: Action::classify(&action_text),
        action_text,
        symbol,
        quantity: decimal(&["Quantity", "quantity"]),
        price: decimal(&["Price", "price"]),
        amount: decimal(&["Amount", "amount"]),
    }
}

/// Parse a transactions export, oldest first.
///
/// Rows on the same date keep their export order.
pub fn parse_transactions(json: &str, today: NaiveDate) -> Result<Vec<Transaction>, ReconstructError> {
    let root: Value = serde_json::from_str(json)?;
    let items = root
        .get("BrokerageTransactions")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut txns: Vec<Transaction> = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            tracing::warn!(item = %item, "skipping non-object transaction entry");
            continue;
        }
        txns.push(parse_item(item, today));
    }
    txns.sort_by_key(|t| t.date);

    tracing::debug!(count = txns.len(), "parsed brokerage transactions");
    Ok(txns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn dates_in_common_export_formats() {
        let today = d(2025, 6, 1);
        assert_eq!(parse_lenient_date("2025-01-31", today), d(2025, 1, 31));
        assert_eq!(parse_lenient_date("01/31/2025", today), d(2025, 1, 31));
        assert_eq!(parse_lenient_date("1-5-25", today), d(2025, 1, 5));
        assert_eq!(
            parse_lenient_date("02/03/2025 as of 01/31/2025", today),
            d(2025, 2, 3)
        );
    }

    #[test]
    fn unreadable_dates_fall_back_to_today() {
        let today = d(2025, 6, 1);
        assert_eq!(parse_lenient_date("", today), today);
        assert_eq!(parse_lenient_date("pending", today), today);
        assert_eq!(parse_lenient_date("13/45/2025", today), today);
    }

    #[test]
    fn amounts_are_lenient() {
        assert_eq!(parse_lenient_decimal("$1,234.50"), dec("1234.50"));
        assert_eq!(parse_lenient_decimal("($12.00)"), dec("-12.00"));
        assert_eq!(parse_lenient_decimal("--"), Decimal::ZERO);
        assert_eq!(parse_lenient_decimal(""), Decimal::ZERO);
        assert_eq!(parse_lenient_decimal("n/a"), Decimal::ZERO);
    }

    #[test]
    fn actions_are_classified() {
        assert_eq!(Action::classify("Buy"), Action::Buy);
        assert_eq!(Action::classify("SELL"), Action::Sell);
        assert_eq!(Action::classify("Qualified Dividend"), Action::Income);
        assert_eq!(Action::classify("Bank Interest"), Action::Income);
        assert_eq!(Action::classify("MoneyLink Transfer"), Action::Transfer);
        assert_eq!(Action::classify("Journal"), Action::Other);
        assert_eq!(Action::classify("Buy to Open"), Action::Other);
    }

    #[test]
    fn parses_and_sorts_export() -> anyhow::Result<()> {
        let json = r#"{
            "BrokerageTransactions": [
                {"Date": "02/03/2025", "Action": "Sell", "Symbol": "aapl", "Quantity": "2", "Price": "$200.00", "Amount": "$400.00"},
                {"date": "2025-01-15", "action": "Buy", "Symbol": "AAPL", "quantity": 10, "price": 150, "amount": "($1,500.00)"},
                {"Date": "01/20/2025", "Action": "Qualified Dividend", "Symbol": "AAPL", "Amount": "$3.10"},
                "not an object"
            ]
        }"#;
        let txns = parse_transactions(json, d(2025, 6, 1))?;
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].date, d(2025, 1, 15));
        assert_eq!(txns[0].action, Action::Buy);
        assert_eq!(txns[0].quantity, dec("10"));
        assert_eq!(txns[0].amount, dec("-1500.00"));
        assert_eq!(txns[1].action, Action::Income);
        assert_eq!(txns[1].quantity, Decimal::ZERO);
        assert_eq!(txns[2].symbol.as_deref(), Some("AAPL"));
        assert_eq!(txns[2].action_text, "SELL");
        Ok(())
    }

    #[test]
    fn missing_list_is_empty() -> anyhow::Result<()> {
        assert!(parse_transactions("{}", d(2025, 6, 1))?.is_empty());
        assert!(parse_transactions("not json", d(2025, 6, 1)).is_err());
        Ok(())
    }
}
