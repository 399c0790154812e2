//! Orders sub-client — place and list.

use crate::client::TradingClient;
use crate::domain::order::wire::{OrderCreateRequest, OrderResponse};
use crate::domain::order::{NewOrder, Order};
use crate::error::{HttpError, SdkError};
use crate::http::RetryPolicy;

pub struct Orders<'a> {
    pub(crate) client: &'a TradingClient,
}

impl<'a> Orders<'a> {
    /// Validate locally, then submit.
    ///
    /// Backend rejections (insufficient funds or holdings, unknown
    /// instrument, schema errors) come back as `SdkError::Validation` carrying
    /// the backend's reason. Never retried.
    pub async fn place(&self, order: &NewOrder) -> Result<Order, SdkError> {
        order.validate()?;
        self.client.require_auth().await?;

        let url = self.client.http.url("/orders/");
        let request = OrderCreateRequest::from(order);

        match self
            .client
            .http
            .post::<OrderResponse, _>(&url, &request, RetryPolicy::None)
            .await
        {
            Ok(resp) => {
                let placed = Order::from(resp);
                tracing::info!(
                    "Placed {} {} {} x{} → order {} ({:?})",
                    placed.order_type,
                    placed.side,
                    order.symbol,
                    placed.quantity,
                    placed.id,
                    placed.status
                );
                Ok(placed)
            }
            Err(HttpError::BadRequest { detail, .. }) | Err(HttpError::NotFound(detail)) => {
                tracing::debug!("Order for {} rejected: {}", order.symbol, detail);
                Err(SdkError::Validation(detail))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// All of the user's orders, newest first as the backend returns them.
    pub async fn list(&self) -> Result<Vec<Order>, SdkError> {
        self.client.require_auth().await?;
        let url = self.client.http.url("/orders/");
        let orders: Vec<OrderResponse> = self.client.http.get(&url, RetryPolicy::Idempotent).await?;
        Ok(orders.into_iter().map(Order::from).collect())
    }

    /// Orders that can still fill.
    pub async fn open(&self) -> Result<Vec<Order>, SdkError> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(Order::is_open)
            .collect())
    }
}
