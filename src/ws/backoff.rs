//! Reconnect backoff policy.

use std::time::Duration;

/// Exponential backoff settings for reconnecting a market data socket.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffConfig {
    /// Delay before the first reconnect attempt.
    pub base: Duration,
    /// Multiplier applied per attempt.
    pub factor: f64,
    /// Upper bound on any delay, jitter included.
    pub max: Duration,
    /// Add random jitter on top of the exponential delay.
    pub jitter: bool,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(500),
            factor: 2.0,
            max: Duration::from_secs(30),
            jitter: true,
        }
    }
}

/// Stateful backoff counter.
///
/// Delays never decrease between resets: jitter is bounded by the growth
/// between two consecutive attempts, and the cap applies after jitter.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    attempt: u32,
}

impl Backoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    pub fn config(&self) -> &BackoffConfig {
        &self.config
    }

    /// Number of delays handed out since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay for the next reconnect attempt; advances the counter.
    pub fn next_delay(&mut self) -> Duration {
        let raw = self.raw_ms(self.attempt);
        let jitter = if self.config.jitter {
            let spread = (self.config.factor - 1.0).clamp(0.0, 0.25);
            raw * spread * rand::random::<f64>()
        } else {
            0.0
        };

        self.attempt = self.attempt.saturating_add(1);

        let cap = self.config.max.as_millis() as f64;
        Duration::from_millis((raw + jitter).min(cap) as u64)
    }

    /// Back to the base delay, after a successful connection.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    fn raw_ms(&self, attempt: u32) -> f64 {
        let exp = attempt.min(i32::MAX as u32) as i32;
        self.config.base.as_millis() as f64 * self.config.factor.max(1.0).powi(exp)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(BackoffConfig::default())
    }
}
