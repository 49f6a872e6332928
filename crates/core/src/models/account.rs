use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::asset::AssetCategory;

/// A user-owned container of balances (e.g. "Checking", "Brokerage").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(user_id: Uuid, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            created_at,
        }
    }
}

/// Per-account, per-asset running total.
///
/// Unique per `(account_id, category, ticker)`. `current_balance` is only
/// ever changed by the store applying transaction deltas; the valuation
/// engine never reads it for historical dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub id: Uuid,
    pub account_id: Uuid,
    pub category: AssetCategory,
    pub ticker: String,
    pub current_balance: Decimal,
}

impl AccountBalance {
    pub fn new(account_id: Uuid, category: AssetCategory, ticker: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            category,
            ticker: ticker.into(),
            current_balance: Decimal::ZERO,
        }
    }
}

/// An account together with all of its balances, as the valuation
/// services consume it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountWithBalances {
    pub account: Account,
    pub balances: Vec<AccountBalance>,
}
