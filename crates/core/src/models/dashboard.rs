use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Income/expense totals for one calendar month, in the reporting currency.
/// Expenses include taxation; transfers are not counted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFlow {
    pub income: Decimal,
    pub expenses: Decimal,
    pub net: Decimal,
}

/// Converted current total of one account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountTotal {
    pub account_id: Uuid,
    pub name: String,
    pub total: Decimal,
}

/// Headline numbers for "now".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub as_of_date: NaiveDate,
    pub reporting_currency: String,
    pub total_value: Decimal,
    /// Sorted by total, largest first.
    pub accounts: Vec<AccountTotal>,
    pub current_month: MonthlyFlow,
    pub previous_month: MonthlyFlow,
    /// `current_month.net - previous_month.net`
    pub net_change: Decimal,
    /// Percent change against `|previous_month.net|`; `None` when that is zero.
    pub net_change_pct: Option<Decimal>,
    /// True when any balance had to be converted without a real rate.
    pub approximate: bool,
}
