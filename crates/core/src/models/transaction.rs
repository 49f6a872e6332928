use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Type of ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money/assets arriving into a balance
    Income,
    /// Money/assets leaving a balance
    Expense,
    /// Moving value between two balances, possibly converting assets
    Transfer,
    /// Taxes paid out of a balance (debits like an expense)
    Taxation,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Transfer => "transfer",
            TransactionType::Taxation => "taxation",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "transfer" => Ok(TransactionType::Transfer),
            "taxation" => Ok(TransactionType::Taxation),
            other => Err(format!("unknown transaction type: {other}")),
        }
    }
}

/// Sort order for transaction listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionSortOrder {
    /// Newest date first (default for display)
    #[default]
    DateDesc,
    /// Oldest date first
    DateAsc,
}

/// Optional free-text fields attached when recording a transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub description: Option<String>,
    pub category: Option<String>,
}

impl TransactionDetails {
    pub fn described(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            category: None,
        }
    }
}

/// Filter for transaction listings. Every `None` field matches everything;
/// the date range is inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub tx_type: Option<TransactionType>,
    /// Matches either leg's ticker (case-insensitive).
    pub ticker: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub order: TransactionSortOrder,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        if self.tx_type.is_some_and(|t| t != tx.tx_type) {
            return false;
        }
        if let Some(ticker) = &self.ticker {
            let wanted = ticker.trim().to_uppercase();
            let hit = tx.ticker.to_uppercase() == wanted
                || tx
                    .to_ticker
                    .as_deref()
                    .is_some_and(|t| t.to_uppercase() == wanted);
            if !hit {
                return false;
            }
        }
        if self.from.is_some_and(|from| tx.date < from) {
            return false;
        }
        if self.to.is_some_and(|to| tx.date > to) {
            return false;
        }
        true
    }
}

/// A single ledger entry.
///
/// Income, expense and taxation touch exactly one balance
/// (`account_balance_id`). A transfer debits `amount` from
/// `account_balance_id` and credits `to_amount` to `to_account_balance_id`;
/// the two legs are independent amounts, never derived from a rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,

    /// Always positive; the sign comes from `tx_type` and the balance's role.
    pub amount: Decimal,
    pub ticker: String,

    #[serde(default)]
    pub description: Option<String>,
    /// Category or source label (e.g. "Salary", "Groceries")
    #[serde(default)]
    pub category: Option<String>,

    /// Calendar date, no time component: replay is date-granular.
    pub date: NaiveDate,

    /// The balance this transaction applies to (the source leg of a transfer).
    pub account_balance_id: Uuid,

    #[serde(default)]
    pub to_account_id: Option<Uuid>,
    #[serde(default)]
    pub to_account_balance_id: Option<Uuid>,
    #[serde(default)]
    pub to_amount: Option<Decimal>,
    #[serde(default)]
    pub to_ticker: Option<String>,
}

impl Transaction {
    /// Build a single-balance transaction (income, expense or taxation).
    pub fn new(
        user_id: Uuid,
        tx_type: TransactionType,
        account_balance_id: Uuid,
        ticker: impl Into<String>,
        amount: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            tx_type,
            amount,
            ticker: ticker.into(),
            description: None,
            category: None,
            date,
            account_balance_id,
            to_account_id: None,
            to_account_balance_id: None,
            to_amount: None,
            to_ticker: None,
        }
    }

    /// Build a transfer between two balances. The legs may hold different
    /// tickers; `amount` and `to_amount` are taken as given.
    #[allow(clippy::too_many_arguments)]
    pub fn transfer(
        user_id: Uuid,
        from_balance_id: Uuid,
        ticker: impl Into<String>,
        amount: Decimal,
        to_account_id: Uuid,
        to_balance_id: Uuid,
        to_ticker: impl Into<String>,
        to_amount: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            to_account_id: Some(to_account_id),
            to_account_balance_id: Some(to_balance_id),
            to_amount: Some(to_amount),
            to_ticker: Some(to_ticker.into()),
            ..Self::new(
                user_id,
                TransactionType::Transfer,
                from_balance_id,
                ticker,
                amount,
                date,
            )
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_details(mut self, details: TransactionDetails) -> Self {
        self.description = details.description;
        self.category = details.category;
        self
    }

    /// Whether this transaction names `balance_id` as its source or destination.
    pub fn touches(&self, balance_id: Uuid) -> bool {
        self.account_balance_id == balance_id || self.to_account_balance_id == Some(balance_id)
    }

    /// Every balance this transaction moves value in or out of.
    pub fn balance_ids(&self) -> Vec<Uuid> {
        let mut ids = vec![self.account_balance_id];
        if self.tx_type == TransactionType::Transfer {
            if let Some(to) = self.to_account_balance_id {
                if to != self.account_balance_id {
                    ids.push(to);
                }
            }
        }
        ids
    }
}

/// Loosely-typed transaction row as an external row store hands it over:
/// dates and decimals are text. Converted with [`TransactionRow::parse`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: String,
    pub ticker: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub date: String,
    pub account_balance_id: String,
    #[serde(default)]
    pub to_account_id: Option<String>,
    #[serde(default)]
    pub to_account_balance_id: Option<String>,
    #[serde(default)]
    pub to_amount: Option<String>,
    #[serde(default)]
    pub to_ticker: Option<String>,
}

impl TransactionRow {
    /// Convert one row. Dates may be `YYYY-MM-DD` or a full RFC 3339
    /// timestamp (only the calendar date is kept).
    pub fn parse(&self) -> Result<Transaction, String> {
        let date = parse_row_date(&self.date)?;
        let tx_type = TransactionType::from_str(&self.tx_type)?;
        let amount = parse_decimal("amount", &self.amount)?;
        let to_amount = self
            .to_amount
            .as_deref()
            .map(|s| parse_decimal("to_amount", s))
            .transpose()?;

        Ok(Transaction {
            id: parse_uuid("id", &self.id)?,
            user_id: parse_uuid("user_id", &self.user_id)?,
            tx_type,
            amount,
            ticker: self.ticker.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            date,
            account_balance_id: parse_uuid("account_balance_id", &self.account_balance_id)?,
            to_account_id: self
                .to_account_id
                .as_deref()
                .map(|s| parse_uuid("to_account_id", s))
                .transpose()?,
            to_account_balance_id: self
                .to_account_balance_id
                .as_deref()
                .map(|s| parse_uuid("to_account_balance_id", s))
                .transpose()?,
            to_amount,
            to_ticker: self.to_ticker.clone(),
        })
    }

    /// Convert a batch, skipping rows that fail to parse. One bad row must
    /// not take down the whole ledger.
    pub fn parse_rows(rows: &[TransactionRow]) -> Vec<Transaction> {
        rows.iter()
            .filter_map(|row| match row.parse() {
                Ok(tx) => Some(tx),
                Err(reason) => {
                    tracing::warn!(row_id = %row.id, %reason, "Skipping malformed transaction row");
                    None
                }
            })
            .collect()
    }
}

fn parse_row_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| format!("invalid date: {raw:?}"))
}

fn parse_decimal(field: &str, raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|e| format!("invalid {field} {raw:?}: {e}"))
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, String> {
    Uuid::parse_str(raw.trim()).map_err(|e| format!("invalid {field} {raw:?}: {e}"))
}
