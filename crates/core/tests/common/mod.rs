// Shared fixtures for the integration test crates. Each test crate only
// uses part of this module.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use networth_core::clock::{Clock, FixedClock};
use networth_core::errors::CoreError;
use networth_core::models::rates::{Interval, Period};
use networth_core::providers::traits::{HistoricalQuote, PriceProvider, Quote};
use networth_core::services::rate_cache::RateCache;
use networth_core::services::rate_gateway::RateGateway;

// ═══════════════════════════════════════════════════════════════════
// Mock Provider
// ═══════════════════════════════════════════════════════════════════

/// Scriptable price provider. Prices are keyed by upstream ticker
/// ("EURUSD=X", "BTC-USD", "AAPL") and quoted in reporting-currency units.
#[derive(Default)]
pub struct MockProvider {
    current: Mutex<HashMap<String, f64>>,
    history: Mutex<Vec<HistoricalQuote>>,
    /// Any request containing one of these upstream tickers fails.
    failing: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
    pub current_calls: AtomicUsize,
    pub historical_calls: AtomicUsize,
    pub requested: Mutex<Vec<Vec<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, upstream: &str, price: f64) -> Self {
        self.set_price(upstream, price);
        self
    }

    pub fn with_sample(self, upstream: &str, timestamp: DateTime<Utc>, price: f64) -> Self {
        self.history.lock().unwrap().push(HistoricalQuote {
            ticker: upstream.to_string(),
            timestamp,
            price,
        });
        self
    }

    pub fn set_price(&self, upstream: &str, price: f64) {
        self.current
            .lock()
            .unwrap()
            .insert(upstream.to_string(), price);
    }

    pub fn fail_ticker(&self, upstream: &str) {
        self.failing.lock().unwrap().insert(upstream.to_string());
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn historical_calls(&self) -> usize {
        self.historical_calls.load(Ordering::SeqCst)
    }

    fn check(&self, tickers: &[String]) -> Result<(), CoreError> {
        let failing = self.failing.lock().unwrap();
        if self.fail_all.load(Ordering::SeqCst) || tickers.iter().any(|t| failing.contains(t)) {
            return Err(CoreError::Network("connection refused".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PriceProvider for MockProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    async fn get_current_prices(
        &self,
        tickers: &[String],
        _currency: &str,
    ) -> Result<Vec<Quote>, CoreError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(tickers.to_vec());
        self.check(tickers)?;
        let current = self.current.lock().unwrap();
        Ok(tickers
            .iter()
            .filter_map(|t| {
                current.get(t).map(|price| Quote {
                    ticker: t.clone(),
                    price: *price,
                })
            })
            .collect())
    }

    async fn get_historical_prices(
        &self,
        tickers: &[String],
        _currency: &str,
        _period: Period,
        _interval: Interval,
    ) -> Result<Vec<HistoricalQuote>, CoreError> {
        self.historical_calls.fetch_add(1, Ordering::SeqCst);
        self.check(tickers)?;
        Ok(self
            .history
            .lock()
            .unwrap()
            .iter()
            .filter(|q| tickers.contains(&q.ticker))
            .cloned()
            .collect())
    }
}

// ═══════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn midnight(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(0, 0, 0).unwrap().and_utc()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap().and_utc()
}

/// A gateway over `provider` with a 24h cache and a clock pinned to `today`.
/// Returns the clock so tests can move time forward.
pub fn gateway(provider: Arc<MockProvider>, today: NaiveDate) -> (RateGateway, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::at_date(today));
    let gateway = RateGateway::new(
        provider,
        RateCache::new(chrono::Duration::hours(24)),
        Arc::clone(&clock) as Arc<dyn Clock>,
    );
    (gateway, clock)
}
