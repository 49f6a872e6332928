use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::transaction::{Transaction, TransactionType};

/// Signed effect of one transaction on one balance.
///
/// - income: `+amount`
/// - expense, taxation: `-amount`
/// - transfer, destination leg: `+to_amount` (0 when absent)
/// - transfer, source leg: `-amount`
///
/// A transaction that names neither role for `balance_id` contributes 0.
/// The store uses the same rule to keep `current_balance` in step, so a
/// replay up to today always equals the stored running total.
pub fn transaction_delta(tx: &Transaction, balance_id: Uuid) -> Decimal {
    match tx.tx_type {
        TransactionType::Income if tx.account_balance_id == balance_id => tx.amount,
        TransactionType::Expense | TransactionType::Taxation
            if tx.account_balance_id == balance_id =>
        {
            -tx.amount
        }
        TransactionType::Transfer => {
            let mut delta = Decimal::ZERO;
            if tx.to_account_balance_id == Some(balance_id) {
                delta += tx.to_amount.unwrap_or(Decimal::ZERO);
            }
            if tx.account_balance_id == balance_id {
                delta -= tx.amount;
            }
            delta
        }
        _ => Decimal::ZERO,
    }
}

/// Value of a balance at the end of `date`, replayed from zero over every
/// transaction dated on or before it. Order of `transactions` is irrelevant
/// and the stored `current_balance` is never consulted.
pub fn value_of_balance_at_date(
    balance_id: Uuid,
    transactions: &[Transaction],
    date: NaiveDate,
) -> Decimal {
    transactions
        .iter()
        .filter(|tx| tx.date <= date)
        .map(|tx| transaction_delta(tx, balance_id))
        .sum()
}

/// Transactions that debit or credit `balance_id`.
pub fn transactions_touching(balance_id: Uuid, transactions: &[Transaction]) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.touches(balance_id))
        .cloned()
        .collect()
}

/// Pre-computed replay of one balance: per-date running totals, answered
/// by binary search. Produces exactly what
/// [`value_of_balance_at_date`] produces, in O(log n) per query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BalanceTimeline {
    /// Distinct transaction dates, ascending.
    dates: Vec<NaiveDate>,
    /// `cumulative[i]` = balance at the end of `dates[i]`.
    cumulative: Vec<Decimal>,
}

impl BalanceTimeline {
    pub fn build(balance_id: Uuid, transactions: &[Transaction]) -> Self {
        let mut deltas: Vec<(NaiveDate, Decimal)> = transactions
            .iter()
            .filter(|tx| tx.touches(balance_id))
            .map(|tx| (tx.date, transaction_delta(tx, balance_id)))
            .collect();
        deltas.sort_by_key(|(date, _)| *date);

        let mut timeline = Self::default();
        let mut running = Decimal::ZERO;
        for (date, delta) in deltas {
            running += delta;
            if timeline.dates.last() == Some(&date) {
                if let Some(last) = timeline.cumulative.last_mut() {
                    *last = running;
                }
            } else {
                timeline.dates.push(date);
                timeline.cumulative.push(running);
            }
        }
        timeline
    }

    /// Balance at the end of `date` (inclusive of same-day transactions).
    pub fn value_at(&self, date: NaiveDate) -> Decimal {
        let idx = self.dates.partition_point(|d| *d <= date);
        if idx == 0 {
            Decimal::ZERO
        } else {
            self.cumulative[idx - 1]
        }
    }

    /// Date of the first transaction, if any.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}
