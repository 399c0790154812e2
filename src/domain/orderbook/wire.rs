//! Wire types for market data frames (WS).

use crate::shared::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single price level as sent by the backend (`{price, qty}`).
///
/// A `qty` of zero means "remove this level".
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WsBookLevel {
    pub price: Decimal,
    #[serde(alias = "quantity", alias = "size")]
    pub qty: Decimal,
}

impl WsBookLevel {
    pub fn new(price: impl Into<Decimal>, qty: impl Into<Decimal>) -> Self {
        Self {
            price: price.into(),
            qty: qty.into(),
        }
    }
}

/// Payload of `snapshot`, `delta` and legacy `orderbook` frames.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WsBookData {
    #[serde(default = "Vec::new")]
    pub bids: Vec<WsBookLevel>,
    #[serde(default = "Vec::new")]
    pub asks: Vec<WsBookLevel>,
}

/// Payload of a `trade` frame.
///
/// The backend stamps trades with its event-loop clock in (fractional)
/// seconds, so the timestamp is kept as a float.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WsTradeData {
    pub price: Decimal,
    #[serde(alias = "ts")]
    pub timestamp: f64,
    #[serde(default, alias = "qty")]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub symbol: Option<Symbol>,
    #[serde(default)]
    pub is_simulation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_data_accepts_numbers() {
        let data: WsBookData = serde_json::from_str(
            r#"{"bids":[{"price":100.5,"qty":5}],"asks":[{"price":"101","qty":3}]}"#,
        )
        .unwrap();
        assert_eq!(data.bids[0].price, Decimal::new(1005, 1));
        assert_eq!(data.bids[0].qty, Decimal::from(5));
        assert_eq!(data.asks[0].price, Decimal::from(101));
    }

    #[test]
    fn test_book_data_missing_side_defaults_empty() {
        let data: WsBookData = serde_json::from_str(r#"{"bids":[{"price":1,"qty":1}]}"#).unwrap();
        assert_eq!(data.bids.len(), 1);
        assert!(data.asks.is_empty());
    }

    #[test]
    fn test_trade_accepts_ts_alias_and_backend_extras() {
        let trade: WsTradeData = serde_json::from_str(
            r#"{"symbol":"AAPL","price":187.2,"quantity":12,"ts":1042.5,"is_simulation":true}"#,
        )
        .unwrap();
        assert_eq!(trade.price, Decimal::new(1872, 1));
        assert_eq!(trade.timestamp, 1042.5);
        assert_eq!(trade.quantity, Some(Decimal::from(12)));
        assert_eq!(trade.symbol, Some(Symbol::from("AAPL")));
        assert!(trade.is_simulation);
    }
}
