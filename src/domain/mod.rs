//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains what its domain needs of:
//! - `mod.rs` — Domain types (validated, business-logic-ready)
//! - `wire.rs` — Raw serde structs matching backend payloads
//! - `convert.rs` — Conversions between the two
//! - `state.rs` — State containers updated from the market data stream
//! - `client.rs` — Sub-client with HTTP methods and caching

pub mod account;
pub mod instrument;
pub mod order;
pub mod orderbook;
