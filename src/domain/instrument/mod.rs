//! Instrument domain — tradable symbols and their reference price.

#[cfg(feature = "http")]
pub mod client;
pub mod wire;

use crate::error::SdkError;
use crate::shared::Symbol;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_SYMBOL_LEN: usize = 10;

/// A listed instrument.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub id: i64,
    pub symbol: Symbol,
    pub name: String,
    /// Reference price kept by the backend, not the live last trade.
    pub current_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<wire::InstrumentResponse> for Instrument {
    fn from(resp: wire::InstrumentResponse) -> Self {
        Instrument {
            id: resp.id,
            symbol: resp.symbol,
            name: resp.name,
            current_price: resp.current_price,
            is_active: resp.is_active,
            created_at: resp.created_at,
            updated_at: resp.updated_at,
        }
    }
}

/// Listing form for `instruments().create()`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInstrument {
    pub symbol: Symbol,
    pub name: String,
    pub current_price: Decimal,
}

impl NewInstrument {
    pub fn new(symbol: impl Into<Symbol>, name: impl Into<String>, current_price: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
            current_price,
        }
    }

    pub fn validate(&self) -> Result<(), SdkError> {
        let len = self.symbol.as_str().chars().count();
        if len == 0 || len > MAX_SYMBOL_LEN {
            return Err(SdkError::Validation(format!(
                "Symbol must be 1 to {} characters",
                MAX_SYMBOL_LEN
            )));
        }
        if self.name.trim().is_empty() {
            return Err(SdkError::Validation("Name is required".to_string()));
        }
        if self.current_price <= Decimal::ZERO {
            return Err(SdkError::Validation(
                "Price must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
