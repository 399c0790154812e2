//! Authentication — password login, registration, bearer token lifecycle.
//!
//! ## Token model
//!
//! - `POST /auth/login` takes an OAuth2 password form and returns a bearer
//!   token. The SDK keeps it in a private field of the HTTP client and injects
//!   it as `Authorization: Bearer <token>`. There is no public `.token()`
//!   accessor.
//! - The token is also written to a [`TokenStore`] so a later process can
//!   pick the session up again with `client.auth().restore()`.
//! - Logout is purely client-side: the backend has no logout route, so the
//!   token is dropped from memory and from the store.
//! - A 401 from `GET /accounts/me` means the token is no longer accepted;
//!   the SDK logs the user out in that case.

#[cfg(feature = "http")]
pub mod client;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use store::{FileTokenStore, MemoryTokenStore, StoredToken, TokenStore};

// ============================================================================
// Session types
// ============================================================================

/// Public view of the current session. Carries no secret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthCredentials {
    /// Login name used for the session, when known.
    pub username: Option<String>,
    pub token_type: String,
    pub issued_at: DateTime<Utc>,
}

impl From<&StoredToken> for AuthCredentials {
    fn from(token: &StoredToken) -> Self {
        Self {
            username: token.username.clone(),
            token_type: token.token_type.clone(),
            issued_at: token.issued_at,
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

/// Response from `POST /auth/login`.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .finish()
    }
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Response from `POST /auth/register`.
///
/// The backend echoes the created user; only the fields the dashboard uses
/// are decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}
