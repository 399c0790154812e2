//! Wire types for the `/orders` endpoints.

use crate::shared::{serde_util, Side, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{OrderStatus, OrderType};

/// Body of `POST /orders/`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OrderCreateRequest {
    pub instrument_symbol: Symbol,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub quantity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
}

/// Order row returned by `POST /orders/` and `GET /orders/`.
#[derive(Deserialize, Debug, Clone)]
pub struct OrderResponse {
    pub id: i64,
    pub instrument_id: i64,
    pub side: Side,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    #[serde(default)]
    pub price: Option<Decimal>,
    pub quantity: u64,
    #[serde(default)]
    pub filled_quantity: u64,
    #[serde(with = "serde_util::backend_datetime")]
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_order_response() {
        let json = r#"{
            "id": 42,
            "instrument_id": 3,
            "side": "BUY",
            "type": "LIMIT",
            "status": "PARTIALLY_FILLED",
            "price": "150.2500",
            "quantity": 10,
            "filled_quantity": 4,
            "created_at": "2024-05-01T12:30:00.123456"
        }"#;
        let order: OrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, 42);
        assert_eq!(order.side, Side::Buy);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.price, Some("150.25".parse().unwrap()));
        assert_eq!(order.filled_quantity, 4);
    }

    #[test]
    fn test_market_order_response_null_price() {
        let json = r#"{"id":1,"instrument_id":1,"side":"SELL","type":"MARKET","status":"FILLED",
            "price":null,"quantity":5,"filled_quantity":5,"created_at":"2024-05-01T12:30:00"}"#;
        let order: OrderResponse = serde_json::from_str(json).unwrap();
        assert_eq!(order.price, None);
        assert_eq!(order.status, OrderStatus::Filled);
    }
}
