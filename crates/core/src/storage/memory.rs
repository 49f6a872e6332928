//! In-process implementation of [`DataStore`].

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::traits::DataStore;
use crate::errors::CoreError;
use crate::models::account::{Account, AccountBalance};
use crate::models::asset::{normalize_ticker, AssetCategory};
use crate::models::profile::Profile;
use crate::models::transaction::{Transaction, TransactionType};
use crate::services::ledger::transaction_delta;

#[derive(Debug, Default)]
struct State {
    profiles: HashMap<Uuid, Profile>,
    accounts: HashMap<Uuid, Account>,
    balances: HashMap<Uuid, AccountBalance>,
    transactions: HashMap<Uuid, Transaction>,
}

impl State {
    fn owned_account(&self, user_id: Uuid, account_id: Uuid) -> Option<&Account> {
        self.accounts
            .get(&account_id)
            .filter(|account| account.user_id == user_id)
    }

    fn owned_balance(&self, user_id: Uuid, balance_id: Uuid) -> Option<&AccountBalance> {
        let balance = self.balances.get(&balance_id)?;
        self.owned_account(user_id, balance.account_id)?;
        Some(balance)
    }

    fn owned_transaction(&self, user_id: Uuid, tx_id: Uuid) -> Option<&Transaction> {
        self.transactions
            .get(&tx_id)
            .filter(|tx| tx.user_id == user_id)
    }

    /// Every balance `tx` names must exist and belong to its user.
    fn check_references(&self, tx: &Transaction) -> Result<(), CoreError> {
        if self.owned_balance(tx.user_id, tx.account_balance_id).is_none() {
            return Err(CoreError::not_found("Balance", tx.account_balance_id));
        }
        if tx.tx_type == TransactionType::Transfer {
            let to = tx.to_account_balance_id.ok_or_else(|| {
                CoreError::ValidationError("Transfer requires a destination balance".into())
            })?;
            if self.owned_balance(tx.user_id, to).is_none() {
                return Err(CoreError::not_found("Balance", to));
            }
        }
        Ok(())
    }

    /// Add (`sign = 1`) or reverse (`sign = -1`) the deltas of `tx` on
    /// every balance it touches that still exists.
    fn apply(&mut self, tx: &Transaction, sign: i64) {
        for balance_id in tx.balance_ids() {
            if let Some(balance) = self.balances.get_mut(&balance_id) {
                balance.current_balance += transaction_delta(tx, balance_id) * Decimal::from(sign);
            }
        }
    }

    /// Remove every transaction touching one of `balance_ids`, reversing
    /// its effect on the balances that survive.
    fn remove_transactions_touching(&mut self, balance_ids: &[Uuid]) -> usize {
        let doomed: Vec<Uuid> = self
            .transactions
            .values()
            .filter(|tx| balance_ids.iter().any(|id| tx.touches(*id)))
            .map(|tx| tx.id)
            .collect();

        for tx_id in &doomed {
            if let Some(tx) = self.transactions.remove(tx_id) {
                self.apply(&tx, -1);
            }
        }
        doomed.len()
    }
}

/// In-memory [`DataStore`]: the reference implementation used by tests
/// and by embedders that keep their own persistence.
///
/// All state sits behind one async mutex, so every mutation (row write plus
/// running-total update) is atomic and upserts cannot race.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_date(mut txs: Vec<Transaction>) -> Vec<Transaction> {
    txs.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    txs
}

#[async_trait]
impl DataStore for MemoryStore {
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, CoreError> {
        let state = self.state.lock().await;
        Ok(state.profiles.get(&user_id).cloned())
    }

    async fn save_profile(&self, profile: &Profile) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        state.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn create_account(&self, account: Account) -> Result<Account, CoreError> {
        let mut state = self.state.lock().await;
        if state.accounts.contains_key(&account.id) {
            return Err(CoreError::Conflict(format!(
                "Account {} already exists",
                account.id
            )));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Option<Account>, CoreError> {
        let state = self.state.lock().await;
        Ok(state.owned_account(user_id, account_id).cloned())
    }

    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<Account>, CoreError> {
        let state = self.state.lock().await;
        let mut accounts: Vec<Account> = state
            .accounts
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        Ok(accounts)
    }

    async fn delete_account(&self, user_id: Uuid, account_id: Uuid) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        if state.owned_account(user_id, account_id).is_none() {
            return Err(CoreError::not_found("Account", account_id));
        }

        let balance_ids: Vec<Uuid> = state
            .balances
            .values()
            .filter(|b| b.account_id == account_id)
            .map(|b| b.id)
            .collect();

        state.remove_transactions_touching(&balance_ids);
        for id in &balance_ids {
            state.balances.remove(id);
        }
        state.accounts.remove(&account_id);
        Ok(())
    }

    async fn upsert_balance(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        category: AssetCategory,
        ticker: &str,
    ) -> Result<AccountBalance, CoreError> {
        let ticker = normalize_ticker(ticker);
        let mut state = self.state.lock().await;
        if state.owned_account(user_id, account_id).is_none() {
            return Err(CoreError::not_found("Account", account_id));
        }

        if let Some(existing) = state.balances.values().find(|b| {
            b.account_id == account_id && b.category == category && b.ticker == ticker
        }) {
            return Ok(existing.clone());
        }

        let balance = AccountBalance::new(account_id, category, ticker);
        state.balances.insert(balance.id, balance.clone());
        Ok(balance)
    }

    async fn get_balance(
        &self,
        user_id: Uuid,
        balance_id: Uuid,
    ) -> Result<Option<AccountBalance>, CoreError> {
        let state = self.state.lock().await;
        Ok(state.owned_balance(user_id, balance_id).cloned())
    }

    async fn list_balances(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<AccountBalance>, CoreError> {
        let state = self.state.lock().await;
        if state.owned_account(user_id, account_id).is_none() {
            return Err(CoreError::not_found("Account", account_id));
        }
        let mut balances: Vec<AccountBalance> = state
            .balances
            .values()
            .filter(|b| b.account_id == account_id)
            .cloned()
            .collect();
        balances.sort_by(|a, b| (a.category, &a.ticker).cmp(&(b.category, &b.ticker)));
        Ok(balances)
    }

    async fn delete_balance(&self, user_id: Uuid, balance_id: Uuid) -> Result<usize, CoreError> {
        let mut state = self.state.lock().await;
        if state.owned_balance(user_id, balance_id).is_none() {
            return Err(CoreError::not_found("Balance", balance_id));
        }
        let removed = state.remove_transactions_touching(&[balance_id]);
        state.balances.remove(&balance_id);
        Ok(removed)
    }

    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction, CoreError> {
        let mut state = self.state.lock().await;
        if state.transactions.contains_key(&tx.id) {
            return Err(CoreError::Conflict(format!(
                "Transaction {} already exists",
                tx.id
            )));
        }
        state.check_references(&tx)?;
        state.apply(&tx, 1);
        state.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, CoreError> {
        let mut state = self.state.lock().await;
        let old = state
            .owned_transaction(tx.user_id, tx.id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Transaction", tx.id))?;
        state.check_references(&tx)?;

        state.apply(&old, -1);
        state.apply(&tx, 1);
        state.transactions.insert(tx.id, tx.clone());
        Ok(tx)
    }

    async fn delete_transaction(&self, user_id: Uuid, tx_id: Uuid) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        if state.owned_transaction(user_id, tx_id).is_none() {
            return Err(CoreError::not_found("Transaction", tx_id));
        }
        if let Some(tx) = state.transactions.remove(&tx_id) {
            state.apply(&tx, -1);
        }
        Ok(())
    }

    async fn get_transaction(
        &self,
        user_id: Uuid,
        tx_id: Uuid,
    ) -> Result<Option<Transaction>, CoreError> {
        let state = self.state.lock().await;
        Ok(state.owned_transaction(user_id, tx_id).cloned())
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, CoreError> {
        let state = self.state.lock().await;
        let txs = state
            .transactions
            .values()
            .filter(|tx| tx.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted_by_date(txs))
    }

    async fn list_transactions_for_balance(
        &self,
        user_id: Uuid,
        balance_id: Uuid,
    ) -> Result<Vec<Transaction>, CoreError> {
        let state = self.state.lock().await;
        if state.owned_balance(user_id, balance_id).is_none() {
            return Err(CoreError::not_found("Balance", balance_id));
        }
        let txs = state
            .transactions
            .values()
            .filter(|tx| tx.user_id == user_id && tx.touches(balance_id))
            .cloned()
            .collect();
        Ok(sorted_by_date(txs))
    }
}
