//! Auth sub-client — login, registration, logout, session restore.

use crate::auth::{AuthCredentials, RegisterRequest, RegisteredUser, StoredToken, TokenResponse};
use crate::client::TradingClient;
use crate::error::{AuthError, HttpError, SdkError};
use crate::http::RetryPolicy;

/// Sub-client for authentication operations.
pub struct Auth<'a> {
    pub(crate) client: &'a TradingClient,
}

impl<'a> Auth<'a> {
    /// Exchange username and password for a bearer token.
    ///
    /// On success the token is installed on the HTTP client and written to
    /// the token store. A failed store write is logged, not fatal: the
    /// session still works for this process.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthCredentials, SdkError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(SdkError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let url = self.client.http.url("/auth/login");
        let resp: TokenResponse = match self
            .client
            .http
            .post_form(&url, &[("username", username), ("password", password)])
            .await
        {
            Ok(resp) => resp,
            Err(HttpError::Unauthorized) => {
                return Err(AuthError::LoginFailed("Incorrect username or password".into()).into())
            }
            Err(HttpError::BadRequest { detail, .. }) => {
                return Err(AuthError::LoginFailed(detail).into())
            }
            Err(e) => return Err(e.into()),
        };

        let stored = StoredToken::new(resp.access_token, resp.token_type, Some(username.to_string()));
        let credentials = self.install(&stored).await;
        if let Err(e) = self.client.token_store.save(&stored) {
            tracing::warn!("Could not persist session token: {}", e);
        }

        tracing::info!("Logged in as {}", username);
        Ok(credentials)
    }

    /// Create a user. Does not log in.
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisteredUser, SdkError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SdkError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let url = self.client.http.url("/auth/register");
        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        match self
            .client
            .http
            .post(&url, &request, RetryPolicy::None)
            .await
        {
            Ok(user) => Ok(user),
            Err(HttpError::BadRequest { detail, .. }) => {
                Err(AuthError::RegistrationFailed(detail).into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the session from memory and from the token store.
    ///
    /// In-memory state is always cleared; only the store error is reported.
    pub async fn logout(&self) -> Result<(), SdkError> {
        self.client.http.clear_auth_token().await;
        *self.client.auth_credentials.write().await = None;
        self.client.token_store.clear()?;
        tracing::debug!("Session cleared");
        Ok(())
    }

    /// Pick up a token saved by an earlier login.
    ///
    /// Returns the restored credentials, or `None` when the store is empty.
    /// The token is not validated here; call `accounts().me()` for that.
    pub async fn restore(&self) -> Result<Option<AuthCredentials>, SdkError> {
        match self.client.token_store.load()? {
            Some(stored) => {
                let credentials = self.install(&stored).await;
                tracing::debug!("Restored session for {:?}", credentials.username);
                Ok(Some(credentials))
            }
            None => Ok(None),
        }
    }

    /// Current session, if any.
    pub async fn credentials(&self) -> Option<AuthCredentials> {
        self.client.auth_credentials.read().await.clone()
    }

    /// Whether a bearer token is installed. Not server-validated.
    pub async fn is_authenticated(&self) -> bool {
        self.client.http.has_auth_token().await
    }

    async fn install(&self, stored: &StoredToken) -> AuthCredentials {
        let credentials = AuthCredentials::from(stored);
        self.client
            .http
            .set_auth_token(Some(stored.access_token.clone()))
            .await;
        *self.client.auth_credentials.write().await = Some(credentials.clone());
        credentials
    }
}
