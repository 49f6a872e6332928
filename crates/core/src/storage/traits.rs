use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::account::{Account, AccountBalance};
use crate::models::asset::AssetCategory;
use crate::models::profile::Profile;
use crate::models::transaction::Transaction;

/// Row store holding profiles, accounts, balances and transactions.
///
/// Every call is scoped to the owning user: rows belonging to someone else
/// behave as if they did not exist. Implementations must keep each
/// balance's `current_balance` equal to the sum of its transaction deltas,
/// and every transaction mutation must update the affected balances
/// atomically with the row change.
#[async_trait]
pub trait DataStore: Send + Sync {
    // ── Profiles ────────────────────────────────────────────────────
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, CoreError>;

    async fn save_profile(&self, profile: &Profile) -> Result<(), CoreError>;

    // ── Accounts ────────────────────────────────────────────────────
    async fn create_account(&self, account: Account) -> Result<Account, CoreError>;

    async fn get_account(&self, user_id: Uuid, account_id: Uuid)
        -> Result<Option<Account>, CoreError>;

    async fn list_accounts(&self, user_id: Uuid) -> Result<Vec<Account>, CoreError>;

    /// Delete an account with its balances and every transaction touching them.
    async fn delete_account(&self, user_id: Uuid, account_id: Uuid) -> Result<(), CoreError>;

    // ── Balances ────────────────────────────────────────────────────

    /// Return the balance for `(account, category, ticker)`, creating it at
    /// zero if absent. Concurrent calls for the same triple yield one row.
    async fn upsert_balance(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        category: AssetCategory,
        ticker: &str,
    ) -> Result<AccountBalance, CoreError>;

    async fn get_balance(
        &self,
        user_id: Uuid,
        balance_id: Uuid,
    ) -> Result<Option<AccountBalance>, CoreError>;

    async fn list_balances(
        &self,
        user_id: Uuid,
        account_id: Uuid,
    ) -> Result<Vec<AccountBalance>, CoreError>;

    /// Delete a balance and every transaction naming it as source or
    /// destination. Returns how many transactions were removed.
    async fn delete_balance(&self, user_id: Uuid, balance_id: Uuid) -> Result<usize, CoreError>;

    // ── Transactions ────────────────────────────────────────────────
    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction, CoreError>;

    /// Replace a transaction by id: reverse the old deltas, apply the new.
    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, CoreError>;

    async fn delete_transaction(&self, user_id: Uuid, tx_id: Uuid) -> Result<(), CoreError>;

    async fn get_transaction(
        &self,
        user_id: Uuid,
        tx_id: Uuid,
    ) -> Result<Option<Transaction>, CoreError>;

    /// All of a user's transactions, oldest first.
    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, CoreError>;

    /// Transactions naming `balance_id` as source or destination, oldest first.
    async fn list_transactions_for_balance(
        &self,
        user_id: Uuid,
        balance_id: Uuid,
    ) -> Result<Vec<Transaction>, CoreError>;
}
