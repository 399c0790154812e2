//! Ticker state — last trade price, previous price and trade timestamp.

use super::wire::WsTradeData;
use crate::shared::Symbol;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Direction of the last price move, used for up/down colouring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceDirection {
    Up,
    Down,
    Flat,
    /// Fewer than two trades seen.
    Unknown,
}

/// Last-trade view for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerState {
    pub symbol: Symbol,
    pub price: Option<Decimal>,
    pub previous: Option<Decimal>,
    pub timestamp: Option<f64>,
    pub quantity: Option<Decimal>,
    /// The last trade came from the backend's price simulation, not a fill.
    pub simulated: bool,
}

impl TickerState {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            ..Default::default()
        }
    }

    /// Apply a trade print. Returns `false` when the trade is older than the
    /// current one and was dropped.
    pub fn apply_trade(&mut self, trade: &WsTradeData) -> bool {
        if let Some(current) = self.timestamp {
            if trade.timestamp < current {
                return false;
            }
        }

        self.previous = self.price;
        self.price = Some(trade.price);
        self.timestamp = Some(trade.timestamp);
        self.quantity = trade.quantity;
        self.simulated = trade.is_simulation;
        true
    }

    /// Forget the trade clock so the next trade is accepted whatever its
    /// timestamp. Prices stay for display.
    ///
    /// Trade timestamps come from the backend's process clock, which starts
    /// over when the backend restarts, so ordering only holds within one
    /// connection.
    pub fn reset_watermark(&mut self) {
        self.timestamp = None;
    }

    pub fn direction(&self) -> PriceDirection {
        match (self.previous, self.price) {
            (Some(prev), Some(price)) if price > prev => PriceDirection::Up,
            (Some(prev), Some(price)) if price < prev => PriceDirection::Down,
            (Some(_), Some(_)) => PriceDirection::Flat,
            _ => PriceDirection::Unknown,
        }
    }

    /// Absolute change from the previous trade.
    pub fn change(&self) -> Option<Decimal> {
        Some(self.price? - self.previous?)
    }
}
