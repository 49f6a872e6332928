pub mod clock;
pub mod config;
pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::Arc;
use uuid::Uuid;

use clock::{Clock, SystemClock};
use config::TrackerConfig;
use errors::CoreError;
use models::{
    account::{Account, AccountBalance, AccountWithBalances},
    asset::normalize_ticker,
    dashboard::DashboardSummary,
    holdings::{HoldingsRequest, HoldingsSeries},
    profile::Profile,
    rates::{Interval, Period},
    transaction::{
        Transaction, TransactionDetails, TransactionFilter, TransactionSortOrder, TransactionType,
    },
};
use providers::{price_api::PriceApiProvider, traits::PriceProvider};
use services::{
    asset_registry::AssetRegistry,
    dashboard::DashboardService,
    holdings::HoldingsService,
    rate_cache::RateCache,
    rate_gateway::RateGateway,
};
use storage::traits::DataStore;

/// A transfer as entered by the user: the destination balance is found or
/// created from `(to_account_id, to_ticker)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub from_balance_id: Uuid,
    pub amount: Decimal,
    pub to_account_id: Uuid,
    pub to_ticker: String,
    pub to_amount: Decimal,
    pub date: NaiveDate,
    pub details: TransactionDetails,
}

/// Main entry point for the net-worth core library.
/// Wires the data store, rate gateway and valuation services together for
/// one deployment; every operation is scoped to a user id.
#[must_use]
pub struct NetworthTracker {
    store: Arc<dyn DataStore>,
    gateway: RateGateway,
    holdings_service: HoldingsService,
    dashboard_service: DashboardService,
    clock: Arc<dyn Clock>,
    config: TrackerConfig,
}

impl std::fmt::Debug for NetworthTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetworthTracker")
            .field("config", &self.config)
            .field("cached_rate_tables", &self.gateway.cache().len())
            .finish()
    }
}

impl NetworthTracker {
    /// Build a tracker on the system clock.
    pub fn new(
        store: Arc<dyn DataStore>,
        provider: Arc<dyn PriceProvider>,
        config: TrackerConfig,
    ) -> Result<Self, CoreError> {
        Self::with_clock(store, provider, config, Arc::new(SystemClock))
    }

    /// Build a tracker that talks to the HTTP price service named in `config`.
    pub fn from_config(store: Arc<dyn DataStore>, config: TrackerConfig) -> Result<Self, CoreError> {
        let provider = Arc::new(PriceApiProvider::from_config(&config)?);
        Self::new(store, provider, config)
    }

    pub fn with_clock(
        store: Arc<dyn DataStore>,
        provider: Arc<dyn PriceProvider>,
        config: TrackerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let cache = RateCache::new(config.rate_cache_ttl());
        Ok(Self {
            store,
            gateway: RateGateway::new(provider, cache, Arc::clone(&clock)),
            holdings_service: HoldingsService::new(),
            dashboard_service: DashboardService::new(),
            clock,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    #[must_use]
    pub fn gateway(&self) -> &RateGateway {
        &self.gateway
    }

    // ── Profile ─────────────────────────────────────────────────────

    /// The user's profile, or an unsaved default in the configured currency.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<Profile, CoreError> {
        Ok(self
            .store
            .get_profile(user_id)
            .await?
            .unwrap_or_else(|| Profile::new(user_id, self.config.default_currency.to_uppercase())))
    }

    /// Set the reporting currency. Must be a 3-letter code.
    pub async fn set_main_currency(
        &self,
        user_id: Uuid,
        currency: &str,
    ) -> Result<Profile, CoreError> {
        let code = currency.trim().to_uppercase();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{currency}': must be exactly 3 ASCII letters (e.g., USD, EUR, PLN)"
            )));
        }
        let mut profile = self.get_profile(user_id).await?;
        profile.main_currency = code;
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    pub async fn set_nickname(
        &self,
        user_id: Uuid,
        nickname: Option<String>,
    ) -> Result<Profile, CoreError> {
        let mut profile = self.get_profile(user_id).await?;
        profile.nickname = nickname
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.store.save_profile(&profile).await?;
        Ok(profile)
    }

    // ── Accounts & Assets ───────────────────────────────────────────

    pub async fn create_account(&self, user_id: Uuid, name: &str) -> Result<Account, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::ValidationError(
                "Account name must not be empty".into(),
            ));
        }
        let account = Account::new(user_id, name, self.clock.now());
        self.store.create_account(account).await
    }

    pub async fn list_accounts_with_balances(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<AccountWithBalances>, CoreError> {
        let accounts = self.store.list_accounts(user_id).await?;
        let mut out = Vec::with_capacity(accounts.len());
        for account in accounts {
            let balances = self.store.list_balances(user_id, account.id).await?;
            out.push(AccountWithBalances { account, balances });
        }
        Ok(out)
    }

    /// Delete an account together with its balances and every transaction
    /// touching them.
    pub async fn delete_account(&self, user_id: Uuid, account_id: Uuid) -> Result<(), CoreError> {
        self.store.delete_account(user_id, account_id).await?;
        tracing::info!(%account_id, "Deleted account");
        Ok(())
    }

    /// Start holding `ticker` in an account. Returns the existing balance if
    /// the account already holds it.
    pub async fn add_asset(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        ticker: &str,
    ) -> Result<AccountBalance, CoreError> {
        let ticker = normalize_ticker(ticker);
        if ticker.is_empty() {
            return Err(CoreError::ValidationError("Ticker must not be empty".into()));
        }
        let category = AssetRegistry::category_of(&ticker);
        self.store
            .upsert_balance(user_id, account_id, category, &ticker)
            .await
    }

    /// Remove a balance and every transaction touching it. Returns the
    /// number of transactions removed.
    pub async fn remove_asset(&self, user_id: Uuid, balance_id: Uuid) -> Result<usize, CoreError> {
        let removed = self.store.delete_balance(user_id, balance_id).await?;
        tracing::info!(%balance_id, removed, "Removed asset balance");
        Ok(removed)
    }

    // ── Transactions ────────────────────────────────────────────────

    /// Record income into an account, creating the balance for `ticker` on
    /// first use.
    pub async fn record_income(
        &self,
        user_id: Uuid,
        account_id: Uuid,
        ticker: &str,
        amount: Decimal,
        date: NaiveDate,
        details: TransactionDetails,
    ) -> Result<Transaction, CoreError> {
        self.check_amount(amount)?;
        self.check_date(date)?;
        let balance = self.add_asset(user_id, account_id, ticker).await?;
        let tx = Transaction::new(
            user_id,
            TransactionType::Income,
            balance.id,
            balance.ticker,
            amount,
            date,
        )
        .with_details(details);
        self.validate_transaction(&tx)?;
        self.store.insert_transaction(tx).await
    }

    pub async fn record_expense(
        &self,
        user_id: Uuid,
        balance_id: Uuid,
        amount: Decimal,
        date: NaiveDate,
        details: TransactionDetails,
    ) -> Result<Transaction, CoreError> {
        self.record_debit(user_id, TransactionType::Expense, balance_id, amount, date, details)
            .await
    }

    pub async fn record_taxation(
        &self,
        user_id: Uuid,
        balance_id: Uuid,
        amount: Decimal,
        date: NaiveDate,
        details: TransactionDetails,
    ) -> Result<Transaction, CoreError> {
        self.record_debit(user_id, TransactionType::Taxation, balance_id, amount, date, details)
            .await
    }

    async fn record_debit(
        &self,
        user_id: Uuid,
        tx_type: TransactionType,
        balance_id: Uuid,
        amount: Decimal,
        date: NaiveDate,
        details: TransactionDetails,
    ) -> Result<Transaction, CoreError> {
        let balance = self
            .store
            .get_balance(user_id, balance_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Balance", balance_id))?;
        let tx = Transaction::new(user_id, tx_type, balance.id, balance.ticker, amount, date)
            .with_details(details);
        self.validate_transaction(&tx)?;
        self.store.insert_transaction(tx).await
    }

    /// Record a transfer. The two legs keep the amounts given; a cross-asset
    /// transfer (100 USD out, 90 EUR in) is not checked against any rate.
    pub async fn record_transfer(
        &self,
        user_id: Uuid,
        request: TransferRequest,
    ) -> Result<Transaction, CoreError> {
        let source = self
            .store
            .get_balance(user_id, request.from_balance_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Balance", request.from_balance_id))?;
        self.check_amount(request.amount)?;
        self.check_amount(request.to_amount)?;
        self.check_date(request.date)?;
        let to_ticker = normalize_ticker(&request.to_ticker);
        if source.account_id == request.to_account_id
            && source.ticker == to_ticker
            && source.category == AssetRegistry::category_of(&to_ticker)
        {
            return Err(CoreError::ValidationError(
                "Transfer source and destination must differ".into(),
            ));
        }
        let destination = self
            .add_asset(user_id, request.to_account_id, &request.to_ticker)
            .await?;

        let tx = Transaction::transfer(
            user_id,
            source.id,
            source.ticker,
            request.amount,
            request.to_account_id,
            destination.id,
            destination.ticker,
            request.to_amount,
            request.date,
        )
        .with_details(request.details);
        self.validate_transaction(&tx)?;
        self.store.insert_transaction(tx).await
    }

    /// Replace a stored transaction. The store reverses the old deltas and
    /// applies the new ones atomically.
    pub async fn update_transaction(&self, tx: Transaction) -> Result<Transaction, CoreError> {
        self.validate_transaction(&tx)?;
        self.store.update_transaction(tx).await
    }

    pub async fn delete_transaction(&self, user_id: Uuid, tx_id: Uuid) -> Result<(), CoreError> {
        self.store.delete_transaction(user_id, tx_id).await
    }

    /// Transactions matching `filter`, newest first unless the filter asks
    /// otherwise.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, CoreError> {
        let mut txs: Vec<Transaction> = self
            .store
            .list_transactions(user_id)
            .await?
            .into_iter()
            .filter(|tx| filter.matches(tx))
            .collect();
        if filter.order == TransactionSortOrder::DateDesc {
            txs.reverse(); // store hands them over oldest-first
        }
        Ok(txs)
    }

    fn check_amount(&self, amount: Decimal) -> Result<(), CoreError> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::ValidationError(format!(
                "Amount must be positive, got {amount}"
            )));
        }
        Ok(())
    }

    /// Dates up to tomorrow are accepted to absorb client time-zone skew.
    fn check_date(&self, date: NaiveDate) -> Result<(), CoreError> {
        let tomorrow = self.clock.today() + chrono::Duration::days(1);
        if date > tomorrow {
            return Err(CoreError::ValidationError(format!(
                "Transaction date {date} is in the future"
            )));
        }
        Ok(())
    }

    fn validate_transaction(&self, tx: &Transaction) -> Result<(), CoreError> {
        self.check_amount(tx.amount)?;
        self.check_date(tx.date)?;
        if tx.tx_type == TransactionType::Transfer {
            let to_amount = tx.to_amount.unwrap_or(Decimal::ZERO);
            if to_amount <= Decimal::ZERO {
                return Err(CoreError::ValidationError(format!(
                    "Transfer destination amount must be positive, got {to_amount}"
                )));
            }
            if tx.to_account_balance_id == Some(tx.account_balance_id) {
                return Err(CoreError::ValidationError(
                    "Transfer source and destination must differ".into(),
                ));
            }
        }
        Ok(())
    }

    // ── Valuation ───────────────────────────────────────────────────

    /// Current-state dashboard numbers in the user's reporting currency.
    pub async fn dashboard(&self, user_id: Uuid) -> Result<DashboardSummary, CoreError> {
        let (profile, accounts, transactions) = self.load_user_data(user_id).await?;

        let mut tickers: BTreeSet<String> = accounts
            .iter()
            .flat_map(|a| a.balances.iter().map(|b| b.ticker.to_uppercase()))
            .collect();
        tickers.extend(transactions.iter().map(|tx| tx.ticker.to_uppercase()));

        let rates = self
            .gateway
            .get_current_rates(&tickers, &profile.main_currency)
            .await;
        Ok(self
            .dashboard_service
            .summarize(&accounts, &transactions, &rates, self.clock.today()))
    }

    /// Daily portfolio value over `period`, in the user's reporting currency.
    ///
    /// Only store failures surface as errors; rate problems degrade the
    /// series to the simple path or 1:1 parity instead.
    pub async fn historical_holdings(
        &self,
        user_id: Uuid,
        period: Period,
        interval: Interval,
    ) -> Result<HoldingsSeries, CoreError> {
        let (profile, accounts, transactions) = self.load_user_data(user_id).await?;
        let today = self.clock.today();

        let request = HoldingsRequest::new(period, interval, &profile.main_currency);
        Ok(self
            .holdings_service
            .calculate_historical_holdings(&self.gateway, &accounts, &transactions, &request, today)
            .await)
    }

    /// Profile, accounts and ledger in one go. Any failure is reported as a
    /// single load failure.
    async fn load_user_data(
        &self,
        user_id: Uuid,
    ) -> Result<(Profile, Vec<AccountWithBalances>, Vec<Transaction>), CoreError> {
        let loaded = async {
            let profile = self.get_profile(user_id).await?;
            let accounts = self.list_accounts_with_balances(user_id).await?;
            let transactions = self.store.list_transactions(user_id).await?;
            Ok::<_, CoreError>((profile, accounts, transactions))
        }
        .await;

        loaded.map_err(|e| match e {
            CoreError::Store(_) => e,
            other => CoreError::Store(other.to_string()),
        })
    }
}
