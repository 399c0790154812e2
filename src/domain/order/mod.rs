//! Order domain — order entry and the user's order blotter.

#[cfg(feature = "http")]
pub mod client;
mod convert;
pub mod wire;

use crate::error::SdkError;
use crate::shared::{Side, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ─── OrderType ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    Market,
    Limit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "MARKET"),
            OrderType::Limit => write!(f, "LIMIT"),
        }
    }
}

// ─── OrderStatus ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    /// No further fills can happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }
}

// ─── Order ───────────────────────────────────────────────────────────────────

/// An order as the backend reports it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub instrument_id: i64,
    pub side: Side,
    pub order_type: OrderType,
    pub status: OrderStatus,
    /// Limit price; `None` for market orders.
    pub price: Option<Decimal>,
    pub quantity: u64,
    pub filled_quantity: u64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn remaining_quantity(&self) -> u64 {
        self.quantity.saturating_sub(self.filled_quantity)
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }
}

// ─── NewOrder ────────────────────────────────────────────────────────────────

/// Order entry form, validated before anything goes over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: u64,
    pub price: Option<Decimal>,
}

impl NewOrder {
    pub fn market(symbol: impl Into<Symbol>, side: Side, quantity: u64) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
        }
    }

    pub fn limit(symbol: impl Into<Symbol>, side: Side, quantity: u64, price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
        }
    }

    /// Client-side checks. Failures are `SdkError::Validation` with a
    /// message fit for the order form.
    pub fn validate(&self) -> Result<(), SdkError> {
        if self.symbol.as_str().trim().is_empty() {
            return Err(SdkError::Validation("Select an instrument".to_string()));
        }
        if self.quantity == 0 {
            return Err(SdkError::Validation(
                "Quantity must be greater than 0".to_string(),
            ));
        }
        if self.order_type == OrderType::Limit {
            match self.price {
                Some(price) if price > Decimal::ZERO => {}
                _ => {
                    return Err(SdkError::Validation(
                        "Limit orders need a price greater than 0".to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    /// Cash needed for a limit buy, if the order has a price.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.map(|p| p * Decimal::from(self.quantity))
    }
}
