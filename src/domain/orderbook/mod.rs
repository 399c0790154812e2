//! Orderbook domain — price levels, live book state, ticker state.

pub mod state;
pub mod ticker;
pub mod wire;

pub use state::{DeltaOutcome, OrderBookSide, OrderBookState};
pub use ticker::{PriceDirection, TickerState};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One aggregated price level on a book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    pub price: Decimal,
    pub qty: Decimal,
}

impl From<wire::WsBookLevel> for BookLevel {
    fn from(level: wire::WsBookLevel) -> Self {
        Self {
            price: level.price,
            qty: level.qty,
        }
    }
}
