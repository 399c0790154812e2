//! Low-level HTTP client — `TradingHttp`.
//!
//! Generic GET/POST plumbing with retry, bearer injection and status
//! mapping. Endpoint paths live in the domain sub-clients; this layer only
//! knows about the form-encoded login since it is the one non-JSON request.

use crate::error::HttpError;
use crate::http::retry::{RetryConfig, RetryPolicy};

use async_lock::RwLock;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Low-level HTTP client for the trading backend.
pub struct TradingHttp {
    base_url: String,
    client: Client,
    /// Bearer token. NEVER exposed publicly.
    auth_token: Arc<RwLock<Option<String>>>,
}

impl TradingHttp {
    pub fn new(base_url: &str) -> Result<Self, HttpError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            auth_token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/orders/`.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write().await = token;
    }

    pub(crate) async fn clear_auth_token(&self) {
        *self.auth_token.write().await = None;
    }

    pub(crate) async fn has_auth_token(&self) -> bool {
        self.auth_token.read().await.is_some()
    }

    // ── Auth ─────────────────────────────────────────────────────────────

    /// OAuth2 password form: `username` + `password`, never retried.
    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, HttpError> {
        let resp = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(send_error)?;
        parse_response(resp).await
    }

    // ── Internal HTTP methods ────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::GET, url, None::<&()>, retry)
            .await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        self.request_with_retry(reqwest::Method::POST, url, Some(body), retry)
            .await
    }

    async fn request_with_retry<T: DeserializeOwned, B: Serialize>(
        &self,
        method: reqwest::Method,
        url: &str,
        body: Option<&B>,
        retry: RetryPolicy,
    ) -> Result<T, HttpError> {
        let config = match &retry {
            RetryPolicy::None => {
                return self.do_request(&method, url, body).await;
            }
            RetryPolicy::Idempotent => RetryConfig::idempotent(),
            RetryPolicy::Custom(c) => c.clone(),
        };

        let mut last_error = None;

        for attempt in 0..=config.max_retries {
            match self.do_request::<T, B>(&method, url, body).await {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if let HttpError::RateLimited {
                        retry_after_ms: Some(ms),
                    } = &e
                    {
                        futures_timer::Delay::new(Duration::from_millis(*ms)).await;
                    }

                    if config.should_retry(&e) && attempt < config.max_retries {
                        let delay = config.delay_for_attempt(attempt);
                        tracing::debug!(
                            attempt = attempt + 1,
                            max = config.max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request to {}",
                            url
                        );
                        futures_timer::Delay::new(delay).await;
                        last_error = Some(e);
                    } else {
                        return Err(e);
                    }
                }
            }
        }

        Err(HttpError::MaxRetriesExceeded {
            attempts: config.max_retries + 1,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }

    async fn do_request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: &reqwest::Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T, HttpError> {
        let mut req = self.client.request(method.clone(), url);

        if let Some(token) = self.auth_token.read().await.as_ref() {
            req = req.bearer_auth(token);
        }

        if let Some(b) = body {
            req = req.json(b);
        }

        let resp = req.send().await.map_err(send_error)?;
        parse_response(resp).await
    }
}

impl Clone for TradingHttp {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            client: self.client.clone(),
            auth_token: self.auth_token.clone(),
        }
    }
}

async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, HttpError> {
    let status = resp.status();

    if status.is_success() {
        return resp.json::<T>().await.map_err(send_error);
    }

    let retry_after_ms = resp
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|secs| secs * 1000);
    let body_text = resp.text().await.unwrap_or_default();

    Err(status_error(status.as_u16(), body_text, retry_after_ms))
}

/// Timeouts get their own variant; everything else stays a reqwest error.
fn send_error(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout
    } else {
        HttpError::Reqwest(err)
    }
}

fn status_error(status: u16, body: String, retry_after_ms: Option<u64>) -> HttpError {
    match status {
        401 => HttpError::Unauthorized,
        404 => HttpError::NotFound(error_detail(&body)),
        429 => HttpError::RateLimited { retry_after_ms },
        400..=499 => HttpError::BadRequest {
            status,
            detail: error_detail(&body),
        },
        _ => HttpError::ServerError { status, body },
    }
}

/// Backend error body: `{"detail": "..."}`, or a list of field errors on 422.
#[derive(Deserialize)]
struct ErrorBody {
    detail: Detail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Deserialize)]
struct FieldError {
    msg: String,
    #[serde(default)]
    loc: Vec<serde_json::Value>,
}

/// Human-readable reason from an error body, falling back to the raw text.
pub(crate) fn error_detail(body: &str) -> String {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody {
            detail: Detail::Message(msg),
        }) => msg,
        Ok(ErrorBody {
            detail: Detail::Fields(fields),
        }) => fields
            .iter()
            .map(|f| match f.loc.last().and_then(|l| l.as_str()) {
                Some(field) => format!("{}: {}", field, f.msg),
                None => f.msg.clone(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Err(_) => body.to_string(),
    }
}
