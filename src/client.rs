//! High-level client — `TradingClient` with nested sub-client accessors.
//!
//! Each domain has its own sub-client in `domain/<name>/client.rs`.
//! This module keeps the builder, shared session and cache state, and the
//! accessor methods.

use crate::auth::client::Auth;
use crate::auth::{AuthCredentials, FileTokenStore, MemoryTokenStore, TokenStore};
use crate::domain::account::client::Accounts;
use crate::domain::instrument::client::Instruments;
use crate::domain::instrument::Instrument;
use crate::domain::order::client::Orders;
use crate::error::{AuthError, SdkError};
use crate::http::TradingHttp;
use crate::shared::Symbol;
use crate::ws::WsConfig;

use async_lock::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

// Re-export sub-client types for convenience.
pub use crate::auth::client::Auth as AuthClient;
pub use crate::domain::account::client::Accounts as AccountsClient;
pub use crate::domain::instrument::client::Instruments as InstrumentsClient;
pub use crate::domain::order::client::Orders as OrdersClient;

/// The primary entry point for the trading backend.
///
/// Provides nested sub-client accessors for each domain:
/// `client.auth()`, `client.orders()`, etc.
pub struct TradingClient {
    pub(crate) http: TradingHttp,
    pub(crate) ws_config: WsConfig,
    pub(crate) token_store: Arc<dyn TokenStore>,
    /// Public half of the session; the token itself lives in `http`.
    pub(crate) auth_credentials: Arc<RwLock<Option<AuthCredentials>>>,
    /// Instrument cache: symbol → (Instrument, fetched_at)
    pub(crate) instrument_cache: Arc<RwLock<HashMap<Symbol, (Instrument, Instant)>>>,
    pub(crate) instrument_cache_ttl: Duration,
}

impl TradingClient {
    pub fn builder() -> TradingClientBuilder {
        TradingClientBuilder::default()
    }

    // ── Sub-client accessors ─────────────────────────────────────────────

    pub fn auth(&self) -> Auth<'_> {
        Auth { client: self }
    }

    pub fn accounts(&self) -> Accounts<'_> {
        Accounts { client: self }
    }

    pub fn instruments(&self) -> Instruments<'_> {
        Instruments { client: self }
    }

    pub fn orders(&self) -> Orders<'_> {
        Orders { client: self }
    }

    /// WS config for market data streams.
    ///
    /// The stream is not embedded in `TradingClient`: its lifetime follows
    /// the views that subscribe to it, not the REST session.
    pub fn ws_config(&self) -> &WsConfig {
        &self.ws_config
    }

    /// New market data stream over native sockets, from the current config.
    #[cfg(feature = "ws-native")]
    pub fn market_stream(&self) -> crate::ws::stream::MarketStream {
        crate::ws::stream::MarketStream::native(self.ws_config.clone())
    }

    pub(crate) async fn require_auth(&self) -> Result<(), SdkError> {
        if self.http.has_auth_token().await {
            Ok(())
        } else {
            Err(AuthError::NotAuthenticated.into())
        }
    }
}

impl Clone for TradingClient {
    fn clone(&self) -> Self {
        Self {
            http: self.http.clone(),
            ws_config: self.ws_config.clone(),
            token_store: self.token_store.clone(),
            auth_credentials: self.auth_credentials.clone(),
            instrument_cache: self.instrument_cache.clone(),
            instrument_cache_ttl: self.instrument_cache_ttl,
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

pub struct TradingClientBuilder {
    base_url: String,
    ws_config: WsConfig,
    instrument_cache_ttl: Duration,
    token_store: Option<Arc<dyn TokenStore>>,
}

impl Default for TradingClientBuilder {
    fn default() -> Self {
        Self {
            base_url: crate::network::DEFAULT_API_URL.to_string(),
            ws_config: WsConfig::default(),
            instrument_cache_ttl: Duration::from_secs(60),
            token_store: None,
        }
    }
}

impl TradingClientBuilder {
    /// Defaults overridden by `TRADEDESK_API_URL`, `TRADEDESK_WS_URL` and
    /// `TRADEDESK_TOKEN_FILE` where set.
    pub fn from_env() -> Self {
        let mut builder = Self::default();
        if let Some(url) = env_var(crate::network::ENV_API_URL) {
            builder = builder.base_url(&url);
        }
        if let Some(url) = env_var(crate::network::ENV_WS_URL) {
            builder = builder.ws_url(&url);
        }
        if let Some(path) = env_var(crate::network::ENV_TOKEN_FILE) {
            builder = builder.token_file(path);
        }
        builder
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn ws_url(mut self, url: &str) -> Self {
        self.ws_config.url = url.to_string();
        self
    }

    /// Replace the whole WS config (backoff, resync mode, timeouts).
    pub fn ws_config(mut self, config: WsConfig) -> Self {
        self.ws_config = config;
        self
    }

    pub fn instrument_cache_ttl(mut self, ttl: Duration) -> Self {
        self.instrument_cache_ttl = ttl;
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    /// Persist the session token as JSON at `path`.
    pub fn token_file(self, path: impl Into<PathBuf>) -> Self {
        self.token_store(Arc::new(FileTokenStore::new(path)))
    }

    pub fn build(self) -> Result<TradingClient, SdkError> {
        Ok(TradingClient {
            http: TradingHttp::new(&self.base_url)?,
            ws_config: self.ws_config,
            token_store: self
                .token_store
                .unwrap_or_else(|| Arc::new(MemoryTokenStore::new())),
            auth_credentials: Arc::new(RwLock::new(None)),
            instrument_cache: Arc::new(RwLock::new(HashMap::new())),
            instrument_cache_ttl: self.instrument_cache_ttl,
        })
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
