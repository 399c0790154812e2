//! Conversions: order wire types ↔ Order domain types.

use super::wire::{OrderCreateRequest, OrderResponse};
use super::{NewOrder, Order, OrderType};

impl From<OrderResponse> for Order {
    fn from(resp: OrderResponse) -> Self {
        Order {
            id: resp.id,
            instrument_id: resp.instrument_id,
            side: resp.side,
            order_type: resp.order_type,
            status: resp.status,
            price: resp.price,
            quantity: resp.quantity,
            filled_quantity: resp.filled_quantity,
            created_at: resp.created_at,
        }
    }
}

impl From<&NewOrder> for OrderCreateRequest {
    fn from(order: &NewOrder) -> Self {
        OrderCreateRequest {
            instrument_symbol: order.symbol.clone(),
            side: order.side,
            order_type: order.order_type,
            quantity: order.quantity,
            // The matching engine prices market orders itself.
            price: match order.order_type {
                OrderType::Limit => order.price,
                OrderType::Market => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::Side;
    use rust_decimal::Decimal;

    #[test]
    fn test_market_order_drops_price() {
        let mut order = NewOrder::market("AAPL", Side::Buy, 3);
        order.price = Some(Decimal::from(99));
        let request = OrderCreateRequest::from(&order);
        assert_eq!(request.price, None);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["type"], "MARKET");
        assert_eq!(json["instrument_symbol"], "AAPL");
        assert!(json.get("price").is_none());
    }

    #[test]
    fn test_limit_order_keeps_price() {
        let order = NewOrder::limit("MSFT", Side::Sell, 2, Decimal::from(410));
        let json = serde_json::to_value(OrderCreateRequest::from(&order)).unwrap();
        assert_eq!(json["side"], "SELL");
        assert_eq!(json["type"], "LIMIT");
        assert_eq!(json["quantity"], 2);
        assert!(json.get("price").is_some());
    }
}
