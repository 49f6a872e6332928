use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::models::account::AccountWithBalances;
use crate::models::dashboard::{AccountTotal, DashboardSummary, MonthlyFlow};
use crate::models::rates::RateTable;
use crate::models::transaction::{Transaction, TransactionType};
use crate::services::conversion::to_reporting;

/// Current-state numbers for the dashboard: no replay, only stored running
/// totals and this month's/last month's flows at current rates.
pub struct DashboardService;

impl DashboardService {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(
        &self,
        accounts: &[AccountWithBalances],
        transactions: &[Transaction],
        rates: &RateTable,
        today: NaiveDate,
    ) -> DashboardSummary {
        let mut approximate = false;
        let mut total_value = Decimal::ZERO;
        let mut account_totals = Vec::with_capacity(accounts.len());

        for entry in accounts {
            let mut total = Decimal::ZERO;
            for balance in &entry.balances {
                let converted = to_reporting(balance.current_balance, &balance.ticker, rates);
                approximate |= converted.is_parity() && !balance.current_balance.is_zero();
                total += converted.amount;
            }
            total_value += total;
            account_totals.push(AccountTotal {
                account_id: entry.account.id,
                name: entry.account.name.clone(),
                total,
            });
        }
        account_totals.sort_by(|a, b| b.total.cmp(&a.total));

        let this_month = month_key(today);
        let last_month = previous_month_key(today);
        let current_month = monthly_flow(transactions, rates, this_month);
        let previous_month = monthly_flow(transactions, rates, last_month);

        let net_change = current_month.net - previous_month.net;
        let net_change_pct = if previous_month.net.is_zero() {
            None
        } else {
            net_change
                .checked_div(previous_month.net.abs())
                .map(|ratio| ratio * Decimal::ONE_HUNDRED)
        };

        DashboardSummary {
            as_of_date: today,
            reporting_currency: rates.reporting_currency().to_string(),
            total_value,
            accounts: account_totals,
            current_month,
            previous_month,
            net_change,
            net_change_pct,
            approximate,
        }
    }
}

impl Default for DashboardService {
    fn default() -> Self {
        Self::new()
    }
}

fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

fn previous_month_key(date: NaiveDate) -> (i32, u32) {
    if date.month() == 1 {
        (date.year() - 1, 12)
    } else {
        (date.year(), date.month() - 1)
    }
}

fn monthly_flow(transactions: &[Transaction], rates: &RateTable, month: (i32, u32)) -> MonthlyFlow {
    let mut flow = MonthlyFlow::default();
    for tx in transactions.iter().filter(|tx| month_key(tx.date) == month) {
        let value = to_reporting(tx.amount, &tx.ticker, rates).amount;
        match tx.tx_type {
            TransactionType::Income => flow.income += value,
            TransactionType::Expense | TransactionType::Taxation => flow.expenses += value,
            TransactionType::Transfer => {}
        }
    }
    flow.net = flow.income - flow.expenses;
    flow
}
