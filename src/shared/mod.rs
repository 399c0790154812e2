//! Shared newtypes used across all domain modules.
//!
//! These types are serialization-transparent: they serialize/deserialize identically
//! to the raw format the backend sends, so they can be used directly in wire types
//! without conversion overhead.

pub mod serde_util;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

// ─── Symbol ──────────────────────────────────────────────────────────────────

/// Newtype for instrument symbols (e.g. `"AAPL"`).
///
/// A symbol identifies both an instrument on the REST API and the
/// per-symbol market data socket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path-safe form of the symbol for URL segments.
    pub fn url_segment(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&Symbol> for Symbol {
    fn from(s: &Symbol) -> Self {
        s.clone()
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Symbol(s.to_string()))
    }
}

impl Serialize for Symbol {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Symbol(s))
    }
}

// ─── Side ────────────────────────────────────────────────────────────────────

/// Order side. On the book, `Buy` levels are bids and `Sell` levels are asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "Buy"),
            Side::Sell => write!(f, "Sell"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_serde() {
        let symbol = Symbol::from("AAPL");
        let json = serde_json::to_string(&symbol).unwrap();
        assert_eq!(json, "\"AAPL\"");
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(symbol, back);
    }

    #[test]
    fn test_symbol_url_segment_escapes() {
        assert_eq!(Symbol::from("BTC/USD").url_segment(), "BTC%2FUSD");
        assert_eq!(Symbol::from("AAPL").url_segment(), "AAPL");
    }

    #[test]
    fn test_side_serde() {
        let buy: Side = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(buy, Side::Buy);
        let sell: Side = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(sell, Side::Sell);
        assert_eq!(serde_json::to_string(&Side::Buy).unwrap(), "\"BUY\"");
    }
}
