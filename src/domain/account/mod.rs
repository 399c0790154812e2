//! Account domain — the user's cash account.

#[cfg(feature = "http")]
pub mod client;

use crate::shared::serde_util;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Cash account returned by `GET /accounts/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    pub cash_balance: Decimal,
    #[serde(deserialize_with = "serde_util::backend_datetime::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "serde_util::backend_datetime_opt::deserialize"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Whether the cash balance covers `amount`.
    pub fn can_afford(&self, amount: Decimal) -> bool {
        self.cash_balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_account() {
        let json = r#"{"id":1,"user_id":9,"cash_balance":"100000.0000",
            "created_at":"2024-05-01T09:00:00.5"}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.user_id, 9);
        assert_eq!(account.cash_balance, Decimal::from(100_000));
        assert!(account.updated_at.is_none());
        assert!(account.can_afford(Decimal::from(99_999)));
        assert!(!account.can_afford(Decimal::from(100_001)));
    }
}
