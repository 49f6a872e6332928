use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use crate::models::rates::RateTable;

/// Cache key: reporting currency plus the sorted, de-duplicated set of
/// requested tickers. Requests with a different ticker set never share an
/// entry, even when the sets overlap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateCacheKey {
    pub reporting_currency: String,
    pub tickers: Vec<String>,
}

impl RateCacheKey {
    pub fn new<'a>(
        reporting_currency: &str,
        tickers: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        let tickers: BTreeSet<String> = tickers.into_iter().map(|t| t.to_uppercase()).collect();
        Self {
            reporting_currency: reporting_currency.to_uppercase(),
            tickers: tickers.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct CachedRates {
    table: RateTable,
    fetched_at: DateTime<Utc>,
}

/// Keyed cache of current-rate tables with a time-to-live.
///
/// The newest entry per currency is kept past its TTL: it is still the best
/// answer when the provider is down (see [`RateCache::latest_for_currency`]).
/// Other expired entries are pruned on insert. Owned by whichever service
/// hosts the gateway; nothing here is global.
#[derive(Debug)]
pub struct RateCache {
    ttl: Duration,
    entries: Mutex<HashMap<RateCacheKey, CachedRates>>,
}

impl RateCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A table for exactly this key, if it was fetched less than `ttl` ago.
    pub fn get_fresh(&self, key: &RateCacheKey, now: DateTime<Utc>) -> Option<RateTable> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .filter(|cached| now - cached.fetched_at < self.ttl)
            .map(|cached| cached.table.clone())
    }

    /// The most recently fetched table for `reporting_currency`, whatever
    /// its ticker set or age.
    pub fn latest_for_currency(&self, reporting_currency: &str) -> Option<RateTable> {
        let currency = reporting_currency.to_uppercase();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .filter(|(key, _)| key.reporting_currency == currency)
            .max_by_key(|(_, cached)| cached.fetched_at)
            .map(|(_, cached)| cached.table.clone())
    }

    /// Store a freshly fetched table. Last write wins for the same key.
    ///
    /// Drops every entry that is past the TTL at `fetched_at` unless it is
    /// the newest one for its currency.
    pub fn insert(&self, key: RateCacheKey, table: RateTable, fetched_at: DateTime<Utc>) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key, CachedRates { table, fetched_at });

        let mut newest: HashMap<String, DateTime<Utc>> = HashMap::new();
        for (key, cached) in entries.iter() {
            let slot = newest
                .entry(key.reporting_currency.clone())
                .or_insert(cached.fetched_at);
            if cached.fetched_at > *slot {
                *slot = cached.fetched_at;
            }
        }
        let ttl = self.ttl;
        entries.retain(|key, cached| {
            fetched_at - cached.fetched_at < ttl
                || newest.get(&key.reporting_currency) == Some(&cached.fetched_at)
        });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}
