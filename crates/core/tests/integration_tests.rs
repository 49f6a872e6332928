// ═══════════════════════════════════════════════════════════════════
// Integration Tests — NetworthTracker facade over MemoryStore and a
// scripted price provider
// ═══════════════════════════════════════════════════════════════════

mod common;

use async_trait::async_trait;
use chrono::Duration;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

use common::{date, midnight, MockProvider};
use networth_core::clock::{Clock, FixedClock};
use networth_core::config::TrackerConfig;
use networth_core::errors::CoreError;
use networth_core::models::account::{Account, AccountBalance};
use networth_core::models::asset::AssetCategory;
use networth_core::models::holdings::ValuationPath;
use networth_core::models::profile::Profile;
use networth_core::models::rates::{Interval, Period};
use networth_core::models::transaction::{
    Transaction, TransactionDetails, TransactionFilter, TransactionSortOrder, TransactionType,
};
use networth_core::storage::memory::MemoryStore;
use networth_core::storage::traits::DataStore;
use networth_core::{NetworthTracker, TransferRequest};

struct Harness {
    tracker: NetworthTracker,
    provider: Arc<MockProvider>,
    clock: Arc<FixedClock>,
    user: Uuid,
}

fn harness_with(provider: MockProvider, config: TrackerConfig) -> Harness {
    let provider = Arc::new(provider);
    let clock = Arc::new(FixedClock::at_date(date(2024, 3, 15)));
    let tracker = NetworthTracker::with_clock(
        Arc::new(MemoryStore::new()),
        Arc::clone(&provider) as _,
        config,
        Arc::clone(&clock) as Arc<dyn Clock>,
    )
    .unwrap();
    Harness {
        tracker,
        provider,
        clock,
        user: Uuid::new_v4(),
    }
}

fn harness() -> Harness {
    harness_with(
        MockProvider::new().with_price("EURUSD=X", 2.0),
        TrackerConfig::default(),
    )
}

// ═══════════════════════════════════════════════════════════════════
// Construction & Profile
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_invalid_config_is_rejected() {
    let config = TrackerConfig {
        rate_cache_ttl_hours: 0,
        ..TrackerConfig::default()
    };
    let err = NetworthTracker::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MockProvider::new()),
        config,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::Config(_)));
}

#[tokio::test]
async fn test_profile_defaults_to_configured_currency() {
    let h = harness_with(
        MockProvider::new(),
        TrackerConfig {
            default_currency: "pln".into(),
            ..TrackerConfig::default()
        },
    );
    let profile = h.tracker.get_profile(h.user).await.unwrap();
    assert_eq!(profile.main_currency, "PLN");
    assert_eq!(profile.id, h.user);
    assert!(profile.nickname.is_none());
}

#[tokio::test]
async fn test_set_main_currency_validates_code() {
    let h = harness();
    let profile = h.tracker.set_main_currency(h.user, " eur ").await.unwrap();
    assert_eq!(profile.main_currency, "EUR");
    assert_eq!(h.tracker.get_profile(h.user).await.unwrap().main_currency, "EUR");

    for bad in ["EURO", "E1R", ""] {
        let err = h.tracker.set_main_currency(h.user, bad).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)), "{bad}");
    }
}

#[tokio::test]
async fn test_set_nickname_trims_and_clears() {
    let h = harness();
    let profile = h
        .tracker
        .set_nickname(h.user, Some("  Sam  ".into()))
        .await
        .unwrap();
    assert_eq!(profile.nickname.as_deref(), Some("Sam"));

    let profile = h.tracker.set_nickname(h.user, Some("   ".into())).await.unwrap();
    assert!(profile.nickname.is_none());
}

// ═══════════════════════════════════════════════════════════════════
// Accounts, assets, transactions
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_create_account_requires_name() {
    let h = harness();
    let err = h.tracker.create_account(h.user, "   ").await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    let account = h.tracker.create_account(h.user, " Checking ").await.unwrap();
    assert_eq!(account.name, "Checking");
}

#[tokio::test]
async fn test_add_asset_uses_registry_category() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Broker").await.unwrap();

    let aapl = h.tracker.add_asset(h.user, account.id, "aapl").await.unwrap();
    let btc = h.tracker.add_asset(h.user, account.id, "BTC").await.unwrap();
    let odd = h.tracker.add_asset(h.user, account.id, "xyz").await.unwrap();
    assert_eq!(aapl.category, AssetCategory::Stock);
    assert_eq!(btc.category, AssetCategory::Crypto);
    assert_eq!(odd.category, AssetCategory::Currency);
    assert_eq!(odd.ticker, "XYZ");

    let again = h.tracker.add_asset(h.user, account.id, "AAPL").await.unwrap();
    assert_eq!(again.id, aapl.id);
}

#[tokio::test]
async fn test_income_auto_provisions_balance() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();

    let tx = h
        .tracker
        .record_income(
            h.user,
            account.id,
            "usd",
            dec!(1000),
            date(2024, 3, 1),
            TransactionDetails::described("Salary"),
        )
        .await
        .unwrap();
    assert_eq!(tx.ticker, "USD");
    assert_eq!(tx.description.as_deref(), Some("Salary"));

    let accounts = h.tracker.list_accounts_with_balances(h.user).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].balances.len(), 1);
    assert_eq!(accounts[0].balances[0].current_balance, dec!(1000));
}

#[tokio::test]
async fn test_transaction_validation() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();

    let err = h
        .tracker
        .record_income(h.user, account.id, "USD", dec!(0), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    // tomorrow is allowed (time-zone slack), the day after is not
    h.tracker
        .record_income(h.user, account.id, "USD", dec!(1), date(2024, 3, 16), TransactionDetails::default())
        .await
        .unwrap();
    let err = h
        .tracker
        .record_income(h.user, account.id, "USD", dec!(1), date(2024, 3, 17), TransactionDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    let err = h
        .tracker
        .record_expense(h.user, Uuid::new_v4(), dec!(1), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NotFound { kind: "Balance", .. }));
}

#[tokio::test]
async fn test_rejected_income_leaves_no_balance_behind() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();

    for (amount, day) in [(dec!(0), date(2024, 3, 1)), (dec!(5), date(2024, 4, 1))] {
        let err = h
            .tracker
            .record_income(h.user, account.id, "GBP", amount, day, TransactionDetails::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    let accounts = h.tracker.list_accounts_with_balances(h.user).await.unwrap();
    assert!(accounts[0].balances.is_empty());
}

#[tokio::test]
async fn test_rejected_transfer_leaves_no_destination_behind() {
    let h = harness();
    let checking = h.tracker.create_account(h.user, "Checking").await.unwrap();
    let travel = h.tracker.create_account(h.user, "Travel").await.unwrap();
    let funding = h
        .tracker
        .record_income(h.user, checking.id, "USD", dec!(100), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap();

    let request = |amount, to_amount, day| TransferRequest {
        from_balance_id: funding.account_balance_id,
        amount,
        to_account_id: travel.id,
        to_ticker: "EUR".into(),
        to_amount,
        date: day,
        details: TransactionDetails::default(),
    };
    for bad in [
        request(dec!(0), dec!(90), date(2024, 3, 2)),
        request(dec!(100), dec!(0), date(2024, 3, 2)),
        request(dec!(100), dec!(90), date(2024, 3, 20)),
    ] {
        let err = h.tracker.record_transfer(h.user, bad).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    let accounts = h.tracker.list_accounts_with_balances(h.user).await.unwrap();
    let travel_balances = accounts
        .iter()
        .find(|a| a.account.id == travel.id)
        .map(|a| a.balances.len());
    assert_eq!(travel_balances, Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_income_in_new_ticker_shares_one_balance() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    let tracker = Arc::new(h.tracker);

    let handles: Vec<_> = [dec!(100), dec!(250)]
        .into_iter()
        .map(|amount| {
            let tracker = Arc::clone(&tracker);
            let (user, account_id) = (h.user, account.id);
            tokio::spawn(async move {
                tracker
                    .record_income(user, account_id, "CHF", amount, date(2024, 3, 1), TransactionDetails::default())
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut balance_ids = Vec::new();
    for handle in handles {
        balance_ids.push(handle.await.unwrap().account_balance_id);
    }
    assert_eq!(balance_ids[0], balance_ids[1]);

    let accounts = tracker.list_accounts_with_balances(h.user).await.unwrap();
    assert_eq!(accounts[0].balances.len(), 1);
    assert_eq!(accounts[0].balances[0].ticker, "CHF");
    assert_eq!(accounts[0].balances[0].current_balance, dec!(350));
}

#[tokio::test]
async fn test_expense_and_taxation_debit_balance() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    let tx = h
        .tracker
        .record_income(h.user, account.id, "USD", dec!(100), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap();
    let balance_id = tx.account_balance_id;

    h.tracker
        .record_expense(h.user, balance_id, dec!(30), date(2024, 3, 2), TransactionDetails::default())
        .await
        .unwrap();
    h.tracker
        .record_taxation(h.user, balance_id, dec!(5), date(2024, 3, 3), TransactionDetails::default())
        .await
        .unwrap();

    let accounts = h.tracker.list_accounts_with_balances(h.user).await.unwrap();
    assert_eq!(accounts[0].balances[0].current_balance, dec!(65));
}

#[tokio::test]
async fn test_cross_asset_transfer_keeps_both_amounts() {
    let h = harness();
    let checking = h.tracker.create_account(h.user, "Checking").await.unwrap();
    let travel = h.tracker.create_account(h.user, "Travel").await.unwrap();
    let funding = h
        .tracker
        .record_income(h.user, checking.id, "USD", dec!(100), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap();

    let transfer = h
        .tracker
        .record_transfer(
            h.user,
            TransferRequest {
                from_balance_id: funding.account_balance_id,
                amount: dec!(100),
                to_account_id: travel.id,
                to_ticker: "eur".into(),
                to_amount: dec!(90),
                date: date(2024, 3, 2),
                details: TransactionDetails::default(),
            },
        )
        .await
        .unwrap();
    assert_eq!(transfer.to_ticker.as_deref(), Some("EUR"));
    assert_eq!(transfer.to_account_id, Some(travel.id));

    let accounts = h.tracker.list_accounts_with_balances(h.user).await.unwrap();
    let by_name = |name: &str| {
        accounts
            .iter()
            .find(|a| a.account.name == name)
            .map(|a| a.balances[0].current_balance)
    };
    assert_eq!(by_name("Checking"), Some(dec!(0)));
    assert_eq!(by_name("Travel"), Some(dec!(90)));
}

#[tokio::test]
async fn test_transfer_to_same_balance_is_rejected() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    let funding = h
        .tracker
        .record_income(h.user, account.id, "USD", dec!(10), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap();

    let err = h
        .tracker
        .record_transfer(
            h.user,
            TransferRequest {
                from_balance_id: funding.account_balance_id,
                amount: dec!(5),
                to_account_id: account.id,
                to_ticker: "USD".into(),
                to_amount: dec!(5),
                date: date(2024, 3, 2),
                details: TransactionDetails::default(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));

    let err = h
        .tracker
        .record_transfer(
            h.user,
            TransferRequest {
                from_balance_id: funding.account_balance_id,
                amount: dec!(5),
                to_account_id: account.id,
                to_ticker: "EUR".into(),
                to_amount: dec!(0),
                date: date(2024, 3, 2),
                details: TransactionDetails::default(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));
}

#[tokio::test]
async fn test_update_and_delete_transaction_through_facade() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    let tx = h
        .tracker
        .record_income(h.user, account.id, "USD", dec!(100), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap();

    let mut edited = tx.clone();
    edited.amount = dec!(250);
    h.tracker.update_transaction(edited.clone()).await.unwrap();
    let balance = h.tracker.list_accounts_with_balances(h.user).await.unwrap()[0].balances[0].clone();
    assert_eq!(balance.current_balance, dec!(250));

    edited.amount = dec!(-1);
    assert!(matches!(
        h.tracker.update_transaction(edited).await.unwrap_err(),
        CoreError::ValidationError(_)
    ));

    h.tracker.delete_transaction(h.user, tx.id).await.unwrap();
    let balance = h.tracker.list_accounts_with_balances(h.user).await.unwrap()[0].balances[0].clone();
    assert_eq!(balance.current_balance, dec!(0));
}

#[tokio::test]
async fn test_list_transactions_filters_and_orders() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    for (ticker, day) in [("USD", 1), ("EUR", 5), ("USD", 10)] {
        h.tracker
            .record_income(h.user, account.id, ticker, dec!(1), date(2024, 3, day), TransactionDetails::default())
            .await
            .unwrap();
    }

    let all = h
        .tracker
        .list_transactions(h.user, &TransactionFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].date, date(2024, 3, 10));

    let usd_oldest_first = h
        .tracker
        .list_transactions(
            h.user,
            &TransactionFilter {
                ticker: Some("usd".into()),
                order: TransactionSortOrder::DateAsc,
                ..TransactionFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(usd_oldest_first.len(), 2);
    assert_eq!(usd_oldest_first[0].date, date(2024, 3, 1));

    let ranged = h
        .tracker
        .list_transactions(
            h.user,
            &TransactionFilter {
                tx_type: Some(TransactionType::Income),
                from: Some(date(2024, 3, 2)),
                to: Some(date(2024, 3, 9)),
                ..TransactionFilter::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(ranged.len(), 1);
    assert_eq!(ranged[0].ticker, "EUR");
}

#[tokio::test]
async fn test_delete_account_and_remove_asset() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    let usd = h
        .tracker
        .record_income(h.user, account.id, "USD", dec!(1), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap();
    h.tracker
        .record_income(h.user, account.id, "EUR", dec!(1), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap();

    let removed = h.tracker.remove_asset(h.user, usd.account_balance_id).await.unwrap();
    assert_eq!(removed, 1);
    assert_eq!(
        h.tracker
            .list_transactions(h.user, &TransactionFilter::default())
            .await
            .unwrap()
            .len(),
        1
    );

    h.tracker.delete_account(h.user, account.id).await.unwrap();
    assert!(h.tracker.list_accounts_with_balances(h.user).await.unwrap().is_empty());
    assert!(h
        .tracker
        .list_transactions(h.user, &TransactionFilter::default())
        .await
        .unwrap()
        .is_empty());
}

// ═══════════════════════════════════════════════════════════════════
// Valuation
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_historical_holdings_end_to_end() {
    let h = harness();
    h.clock.set(midnight(2024, 1, 10));
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    h.tracker
        .record_income(h.user, account.id, "USD", dec!(1000), date(2024, 1, 1), TransactionDetails::default())
        .await
        .unwrap();

    let series = h
        .tracker
        .historical_holdings(h.user, Period::All, Interval::Day1)
        .await
        .unwrap();

    assert_eq!(series.reporting_currency, "USD");
    assert_eq!(series.path, ValuationPath::Simple);
    assert_eq!(series.points.len(), 10);
    assert!(series.points.iter().all(|p| p.total_value == dec!(1000)));
}

#[tokio::test]
async fn test_historical_holdings_in_profile_currency() {
    let h = harness();
    h.tracker.set_main_currency(h.user, "EUR").await.unwrap();
    // USD priced in EUR, still requested in the USD-pair encoding
    h.provider.set_price("USDUSD=X", 0.5);
    h.clock.set(midnight(2024, 1, 3));
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    h.tracker
        .record_income(h.user, account.id, "USD", dec!(100), date(2024, 1, 1), TransactionDetails::default())
        .await
        .unwrap();
    h.tracker
        .record_income(h.user, account.id, "EUR", dec!(10), date(2024, 1, 2), TransactionDetails::default())
        .await
        .unwrap();

    let series = h
        .tracker
        .historical_holdings(h.user, Period::All, Interval::Day1)
        .await
        .unwrap();

    assert_eq!(series.reporting_currency, "EUR");
    let values: Vec<_> = series.points.iter().map(|p| p.total_value).collect();
    assert_eq!(values, vec![dec!(50), dec!(60), dec!(60)]);
}

#[tokio::test]
async fn test_historical_holdings_all_covers_decade_long_ledger() {
    let h = harness_with(MockProvider::new(), TrackerConfig::default());
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    h.tracker
        .record_income(h.user, account.id, "USD", dec!(1000), date(2013, 1, 1), TransactionDetails::default())
        .await
        .unwrap();

    let series = h
        .tracker
        .historical_holdings(h.user, Period::All, Interval::Day1)
        .await
        .unwrap();

    let expected_days = (date(2024, 3, 15) - date(2013, 1, 1)).num_days() as usize + 1;
    assert_eq!(series.points.len(), expected_days);
    assert_eq!(series.points[0].date, date(2013, 1, 1));
    assert_eq!(series.points.last().map(|p| p.date), Some(date(2024, 3, 15)));
    assert!(series.points.iter().all(|p| p.total_value == dec!(1000)));
}

#[tokio::test]
async fn test_dashboard_through_facade() {
    let h = harness();
    let account = h.tracker.create_account(h.user, "Checking").await.unwrap();
    h.tracker
        .record_income(h.user, account.id, "USD", dec!(100), date(2024, 3, 1), TransactionDetails::default())
        .await
        .unwrap();
    h.tracker
        .record_income(h.user, account.id, "EUR", dec!(50), date(2024, 2, 1), TransactionDetails::default())
        .await
        .unwrap();

    let summary = h.tracker.dashboard(h.user).await.unwrap();
    assert_eq!(summary.as_of_date, date(2024, 3, 15));
    assert_eq!(summary.total_value, dec!(200));
    assert_eq!(summary.current_month.income, dec!(100));
    assert_eq!(summary.previous_month.income, dec!(100));
    assert_eq!(summary.net_change, dec!(0));
    assert!(!summary.approximate);

    // second call within the TTL is served from cache
    let calls = h.provider.current_calls();
    h.clock.advance(Duration::hours(1));
    h.tracker.dashboard(h.user).await.unwrap();
    assert_eq!(h.provider.current_calls(), calls);
}

// ═══════════════════════════════════════════════════════════════════
// Store failures
// ═══════════════════════════════════════════════════════════════════

/// A store whose every read fails.
struct BrokenStore;

fn broken<T>() -> Result<T, CoreError> {
    Err(CoreError::NotFound {
        kind: "Table",
        id: "transactions".into(),
    })
}

#[async_trait]
impl DataStore for BrokenStore {
    async fn get_profile(&self, _: Uuid) -> Result<Option<Profile>, CoreError> {
        broken()
    }
    async fn save_profile(&self, _: &Profile) -> Result<(), CoreError> {
        broken()
    }
    async fn create_account(&self, _: Account) -> Result<Account, CoreError> {
        broken()
    }
    async fn get_account(&self, _: Uuid, _: Uuid) -> Result<Option<Account>, CoreError> {
        broken()
    }
    async fn list_accounts(&self, _: Uuid) -> Result<Vec<Account>, CoreError> {
        broken()
    }
    async fn delete_account(&self, _: Uuid, _: Uuid) -> Result<(), CoreError> {
        broken()
    }
    async fn upsert_balance(
        &self,
        _: Uuid,
        _: Uuid,
        _: AssetCategory,
        _: &str,
    ) -> Result<AccountBalance, CoreError> {
        broken()
    }
    async fn get_balance(&self, _: Uuid, _: Uuid) -> Result<Option<AccountBalance>, CoreError> {
        broken()
    }
    async fn list_balances(&self, _: Uuid, _: Uuid) -> Result<Vec<AccountBalance>, CoreError> {
        broken()
    }
    async fn delete_balance(&self, _: Uuid, _: Uuid) -> Result<usize, CoreError> {
        broken()
    }
    async fn insert_transaction(&self, _: Transaction) -> Result<Transaction, CoreError> {
        broken()
    }
    async fn update_transaction(&self, _: Transaction) -> Result<Transaction, CoreError> {
        broken()
    }
    async fn delete_transaction(&self, _: Uuid, _: Uuid) -> Result<(), CoreError> {
        broken()
    }
    async fn get_transaction(&self, _: Uuid, _: Uuid) -> Result<Option<Transaction>, CoreError> {
        broken()
    }
    async fn list_transactions(&self, _: Uuid) -> Result<Vec<Transaction>, CoreError> {
        broken()
    }
    async fn list_transactions_for_balance(
        &self,
        _: Uuid,
        _: Uuid,
    ) -> Result<Vec<Transaction>, CoreError> {
        broken()
    }
}

#[tokio::test]
async fn test_store_failure_surfaces_as_load_error() {
    let tracker = NetworthTracker::new(
        Arc::new(BrokenStore),
        Arc::new(MockProvider::new()),
        TrackerConfig::default(),
    )
    .unwrap();
    let user = Uuid::new_v4();

    let err = tracker
        .historical_holdings(user, Period::Days30, Interval::Day1)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Store(_)));
    assert!(err.to_string().starts_with("Failed to load data"));

    let err = tracker.dashboard(user).await.unwrap_err();
    assert!(matches!(err, CoreError::Store(_)));
}
