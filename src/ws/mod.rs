//! WebSocket layer — frames, events, config, and the market data stream client.
//!
//! - `backoff` — reconnect delay policy (always available)
//! - `transport` — the `Connector` seam and the `tokio-tungstenite` implementation
//! - `stream` — `MarketStream`, the per-symbol subscription multiplexer
//!
//! `transport` and `stream` require the `ws-native` feature.

pub mod backoff;

#[cfg(feature = "ws-native")]
pub mod transport;

#[cfg(feature = "ws-native")]
pub mod stream;

use crate::domain::orderbook::wire::{WsBookData, WsTradeData};
use crate::shared::Symbol;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use backoff::{Backoff, BackoffConfig};

// ─── Outbound messages ───────────────────────────────────────────────────────

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum MessageOut {
    /// Ask the backend to push a full book snapshot for the symbol.
    #[serde(rename = "snapshot_request")]
    SnapshotRequest { symbol: Symbol },
}

impl MessageOut {
    pub fn snapshot_request(symbol: impl Into<Symbol>) -> Self {
        Self::SnapshotRequest {
            symbol: symbol.into(),
        }
    }
}

// ─── Inbound messages ────────────────────────────────────────────────────────

/// Inbound WebSocket message, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Kind {
    /// Full book replacement at a known sequence point.
    #[serde(rename = "snapshot")]
    Snapshot(BookPayload),
    /// Incremental book update relative to the previous sequence.
    #[serde(rename = "delta")]
    Delta(BookPayload),
    /// Full-depth update without sequencing, applied as a snapshot.
    #[serde(rename = "orderbook")]
    Depth(BookPayload),
    #[serde(rename = "trade")]
    Trade(TradePayload),
    #[serde(rename = "error")]
    Error(WsErrorPayload),
    /// Any message type this client does not understand.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BookPayload {
    #[serde(default)]
    pub data: WsBookData,
    #[serde(default)]
    pub seq: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TradePayload {
    pub data: WsTradeData,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WsErrorPayload {
    #[serde(alias = "detail")]
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

/// Decode one text frame.
pub fn decode(text: &str) -> Result<Kind, crate::error::WsError> {
    serde_json::from_str::<Kind>(text)
        .map_err(|e| crate::error::WsError::DeserializationError(e.to_string()))
}

// ─── Connection state ────────────────────────────────────────────────────────

/// Lifecycle of one symbol's transport connection.
///
/// `Idle → Connecting → Open → (Reconnecting ↔ Open) → Closed`
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// No connection attempt made yet.
    Idle,
    /// Handshake in flight. `attempt` is 0 for the first connection.
    Connecting { attempt: u32 },
    /// Socket is up.
    Open,
    /// Waiting `delay` before reconnect attempt number `attempt`, and then
    /// for that attempt's handshake. A resync by reconnect has a zero delay.
    Reconnecting {
        attempt: u32,
        delay: Duration,
        last_error: String,
    },
    /// Last subscriber left (or the stream shut down); transport released.
    Closed { last_error: Option<String> },
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    /// Backoff attempt counter (0 outside of reconnects).
    pub fn attempt(&self) -> u32 {
        match self {
            ConnectionState::Connecting { attempt } => *attempt,
            ConnectionState::Reconnecting { attempt, .. } => *attempt,
            _ => 0,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match self {
            ConnectionState::Reconnecting { last_error, .. } => Some(last_error),
            ConnectionState::Closed { last_error } => last_error.as_deref(),
            _ => None,
        }
    }

    /// Short label for a status indicator.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting { .. } => "connecting",
            ConnectionState::Open => "live",
            ConnectionState::Reconnecting { .. } => "reconnecting",
            ConnectionState::Closed { .. } => "closed",
        }
    }
}

/// How the stream recovers from a sequence gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResyncMode {
    /// Send `snapshot_request` on the open socket.
    #[default]
    RequestSnapshot,
    /// Drop the socket and reconnect; the backend pushes a snapshot on connect.
    Reconnect,
}

/// Configuration for the market data stream.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Base URL; the socket for a symbol is `{url}/{symbol}`.
    pub url: String,
    pub reconnect: bool,
    pub backoff: BackoffConfig,
    pub connect_timeout: Duration,
    pub resync: ResyncMode,
    /// Send `snapshot_request` right after every (re)connect.
    pub request_snapshot_on_open: bool,
}

impl WsConfig {
    /// Socket URL for one symbol.
    pub fn symbol_url(&self, symbol: &Symbol) -> String {
        format!("{}/{}", self.url.trim_end_matches('/'), symbol.url_segment())
    }
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            url: crate::network::DEFAULT_WS_URL.to_string(),
            reconnect: true,
            backoff: BackoffConfig::default(),
            connect_timeout: Duration::from_secs(30),
            resync: ResyncMode::default(),
            request_snapshot_on_open: true,
        }
    }
}
