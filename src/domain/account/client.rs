//! Accounts sub-client.

use crate::client::TradingClient;
use crate::domain::account::Account;
use crate::error::{AuthError, HttpError, SdkError};
use crate::http::RetryPolicy;

pub struct Accounts<'a> {
    pub(crate) client: &'a TradingClient,
}

impl<'a> Accounts<'a> {
    /// The signed-in user's account.
    ///
    /// This is also how the dashboard validates a restored session: a 401
    /// here logs the user out (token cleared from memory and from the token
    /// store) and surfaces as `AuthError::SessionExpired`.
    pub async fn me(&self) -> Result<Account, SdkError> {
        self.client.require_auth().await?;
        let url = self.client.http.url("/accounts/me");

        match self.client.http.get(&url, RetryPolicy::Idempotent).await {
            Ok(account) => Ok(account),
            Err(HttpError::Unauthorized) => {
                tracing::info!("Session rejected by /accounts/me, logging out");
                self.client.auth().logout().await?;
                Err(AuthError::SessionExpired.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
