//! Unified SDK error types.

use thiserror::Error;

/// Top-level SDK error.
#[derive(Error, Debug)]
pub enum SdkError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("WebSocket error: {0}")]
    Ws(#[from] WsError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Rejected order or request input — the message is meant for the end user.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SdkError {
    /// Plain message suitable for showing to the end user.
    ///
    /// Only auth and validation failures are user-facing; everything else
    /// collapses into a generic message.
    pub fn user_message(&self) -> String {
        match self {
            SdkError::Validation(msg) => msg.clone(),
            SdkError::Auth(AuthError::LoginFailed(_)) => "Invalid credentials".to_string(),
            SdkError::Auth(AuthError::RegistrationFailed(msg)) => {
                format!("Registration failed: {}", msg)
            }
            SdkError::Auth(_) | SdkError::Http(HttpError::Unauthorized) => {
                "Your session has expired, please log in again".to_string()
            }
            _ => "Something went wrong, please try again".to_string(),
        }
    }
}

/// HTTP-layer errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[cfg(feature = "http")]
    #[error("Request failed: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Server error {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// 400 / 422 from the backend. `detail` is the backend's human-readable reason.
    #[error("Bad request: {detail}")]
    BadRequest { status: u16, detail: String },

    #[error("Timeout")]
    Timeout,

    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

/// WebSocket errors.
///
/// Transport variants and `SequenceGap` are recovered inside the market
/// stream and never reach subscribers; they only show up as connection
/// state transitions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WsError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Sequence gap: expected {expected}, received {received}")]
    SequenceGap { expected: u64, received: u64 },

    #[error("Connection closed: code={code:?} reason={reason}")]
    Closed { code: Option<u16>, reason: String },
}

/// Authentication errors.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Registration failed: {0}")]
    RegistrationFailed(String),

    #[error("Session expired")]
    SessionExpired,
}

/// Token persistence errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt token file: {0}")]
    Corrupt(String),
}
