use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid symbol {value:?}: symbols must be non-empty and contain no whitespace")]
pub struct SymbolError {
    value: String,
}

/// Normalized ticker symbol (trimmed, upper-cased).
///
/// Brokerage exports and market data disagree on casing and padding; every
/// symbol that crosses a boundary goes through here so map lookups agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn parse(value: &str) -> Result<Self, SymbolError> {
        let normalized = value.trim().to_uppercase();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(SymbolError {
                value: value.to_string(),
            });
        }
        Ok(Self(normalized))
    }

    /// Normalize a possibly-blank raw cell; blank or invalid input yields `None`.
    pub fn from_raw(value: Option<&str>) -> Option<Self> {
        value.and_then(|v| Self::parse(v).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
