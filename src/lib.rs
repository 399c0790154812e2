//! # TradeDesk SDK
//!
//! Rust client for the TradeDesk trading backend: REST collaborators for
//! auth, accounts, instruments and orders, plus a real-time market data
//! stream with automatic reconnect and sequence-checked order books.
//!
//! ## Architecture
//!
//! The SDK is organized in layers:
//!
//! 1. **Core** — Shared newtypes, domain models, order book and ticker state
//! 2. **Auth** — Token model and durable token storage
//! 3. **HTTP API** — `TradingHttp` with per-request retry policies
//! 4. **WebSocket** — `MarketStream` over a pluggable transport (`tokio-tungstenite` natively)
//! 5. **High-Level Client** — `TradingClient` with nested sub-clients and caching
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tradedesk_sdk::prelude::*;
//!
//! let client = TradingClientBuilder::from_env().build()?;
//! client.auth().login("trader@desk.io", "password123").await?;
//! let account = client.accounts().me().await?;
//!
//! let stream = client.market_stream();
//! let mut aapl = stream.subscribe("AAPL");
//! while let Some(view) = aapl.changed().await {
//!     println!("{} bid={:?} last={:?}", view.connection.label(),
//!         view.order_book.best_bid(), view.ticker.price);
//! }
//! ```

// ── Layer 1: Core ────────────────────────────────────────────────────────────

/// Shared newtypes used across all domains.
pub mod shared;

/// Domain modules (vertical slices): types, wire types, conversions, state.
pub mod domain;

/// Unified SDK error types.
pub mod error;

/// Network URL constants.
pub mod network;

// ── Layer 2: Auth ────────────────────────────────────────────────────────────

/// Authentication: credentials, token storage, login/logout.
pub mod auth;

// ── Layer 3: HTTP API ────────────────────────────────────────────────────────

/// HTTP client with retry policies.
#[cfg(feature = "http")]
pub mod http;

// ── Layer 4: WebSocket ───────────────────────────────────────────────────────

/// Market data stream: messages, backoff, transport, subscriptions.
pub mod ws;

// ── Layer 5: High-Level Client ───────────────────────────────────────────────

/// `TradingClient` — the primary entry point.
#[cfg(feature = "http")]
pub mod client;

// ── Prelude ──────────────────────────────────────────────────────────────────

pub mod prelude {
    // Shared newtypes
    pub use crate::shared::{Side, Symbol};

    // Domain types
    pub use crate::domain::account::Account;
    pub use crate::domain::instrument::{Instrument, NewInstrument};
    pub use crate::domain::order::{NewOrder, Order, OrderStatus, OrderType};
    pub use crate::domain::orderbook::{
        BookLevel, OrderBookSide, OrderBookState, PriceDirection, TickerState,
    };

    // Errors
    pub use crate::error::{AuthError, HttpError, SdkError, WsError};

    // Network
    pub use crate::network::{DEFAULT_API_URL, DEFAULT_WS_URL};

    // Auth types
    pub use crate::auth::{
        AuthCredentials, FileTokenStore, MemoryTokenStore, RegisteredUser, TokenStore,
    };

    // HTTP client + sub-clients
    #[cfg(feature = "http")]
    pub use crate::client::{
        AccountsClient, AuthClient, InstrumentsClient, OrdersClient, TradingClient,
        TradingClientBuilder,
    };
    #[cfg(feature = "http")]
    pub use crate::http::retry::{RetryConfig, RetryPolicy};

    // WebSocket types
    pub use crate::ws::{
        BackoffConfig, ConnectionState, Kind, MessageOut, ResyncMode, WsConfig,
    };
    #[cfg(feature = "ws-native")]
    pub use crate::ws::stream::{MarketStream, MarketSubscription, MarketView};
    #[cfg(feature = "ws-native")]
    pub use crate::ws::transport::{Connection, Connector, Frame, TungsteniteConnector};
}
