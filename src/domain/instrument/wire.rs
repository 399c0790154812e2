//! Wire types for the `/instruments` endpoints.

use crate::shared::{serde_util, Symbol};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::NewInstrument;

#[derive(Deserialize, Debug, Clone)]
pub struct InstrumentResponse {
    pub id: i64,
    pub symbol: Symbol,
    pub name: String,
    pub current_price: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(with = "serde_util::backend_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "serde_util::backend_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

/// Body of `POST /instruments/`.
#[derive(Serialize, Debug, Clone)]
pub struct InstrumentCreateRequest {
    pub symbol: Symbol,
    pub name: String,
    pub current_price: Decimal,
}

impl From<&NewInstrument> for InstrumentCreateRequest {
    fn from(new: &NewInstrument) -> Self {
        Self {
            symbol: new.symbol.clone(),
            name: new.name.trim().to_string(),
            current_price: new.current_price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_instrument() {
        let json = r#"{"symbol":"AAPL","name":"Apple Inc.","current_price":"189.5000",
            "id":1,"is_active":true,"created_at":"2024-05-01T09:00:00","updated_at":null}"#;
        let inst: InstrumentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(inst.symbol.as_str(), "AAPL");
        assert_eq!(inst.current_price, "189.5".parse().unwrap());
        assert!(inst.updated_at.is_none());
    }

    #[test]
    fn test_numeric_price_accepted() {
        let json = r#"{"symbol":"T1","name":"Test","current_price":200.0,"id":2,
            "created_at":"2024-05-01T09:00:00Z"}"#;
        let inst: InstrumentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(inst.current_price, Decimal::from(200));
        assert!(inst.is_active);
    }
}
