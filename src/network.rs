//! Network URL constants for the TradeDesk SDK.

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Default WebSocket base URL. The per-symbol socket lives at `{DEFAULT_WS_URL}/{symbol}`.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/api/v1/ws";

/// Environment variable overriding the REST base URL.
pub const ENV_API_URL: &str = "TRADEDESK_API_URL";

/// Environment variable overriding the WebSocket base URL.
pub const ENV_WS_URL: &str = "TRADEDESK_WS_URL";

/// Environment variable pointing at a file used to persist the bearer token.
pub const ENV_TOKEN_FILE: &str = "TRADEDESK_TOKEN_FILE";
