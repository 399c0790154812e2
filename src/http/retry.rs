//! Retry policies for HTTP requests.

use crate::error::HttpError;
use std::time::Duration;

/// Retry policy for an HTTP request.
#[derive(Debug, Clone, Default)]
pub enum RetryPolicy {
    /// No retries. Order placement, login and registration use this.
    #[default]
    None,
    /// Retry on transport failures, timeouts, 429 and 502/503/504.
    /// Default for GET endpoints.
    Idempotent,
    Custom(RetryConfig),
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    /// Spread the delay by ±25%.
    pub jitter: bool,
    /// HTTP status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: true,
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// The default config for idempotent (GET) requests.
    pub fn idempotent() -> Self {
        Self {
            retryable_statuses: vec![429, 502, 503, 504],
            ..Self::default()
        }
    }

    /// Whether a failed attempt is worth repeating under this config.
    pub fn should_retry(&self, error: &HttpError) -> bool {
        match error {
            HttpError::ServerError { status, .. } => self.retryable_statuses.contains(status),
            HttpError::RateLimited { .. } => self.retryable_statuses.contains(&429),
            HttpError::Timeout => true,
            #[cfg(feature = "http")]
            HttpError::Reqwest(re) => re.is_connect() || re.is_request(),
            _ => false,
        }
    }

    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_factor.powi(attempt.min(i32::MAX as u32) as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_ms = if self.jitter {
            let jitter_range = capped * 0.25;
            let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(final_ms as u64)
    }
}
