//! HTTP client layer — `TradingHttp` with per-request retry policies.

pub mod client;
pub mod retry;

pub use client::TradingHttp;
pub use retry::{RetryConfig, RetryPolicy};
