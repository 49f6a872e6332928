use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::clock::Clock;
use crate::models::asset::AssetCategory;
use crate::models::rates::{HistoricalRate, Interval, Period, RateSource, RateTable};
use crate::providers::encoding::strategy_for;
use crate::providers::traits::PriceProvider;
use crate::services::asset_registry::AssetRegistry;
use crate::services::rate_cache::{RateCache, RateCacheKey};

/// Tickers of one asset category, with the provider encoding of each.
struct CategoryRequest {
    category: AssetCategory,
    /// upstream ticker → asset ticker
    upstream: BTreeMap<String, String>,
}

impl CategoryRequest {
    fn upstream_tickers(&self) -> Vec<String> {
        self.upstream.keys().cloned().collect()
    }

    /// Map a ticker returned by the provider back to the asset ticker.
    fn resolve(&self, returned: &str) -> Option<String> {
        let returned = returned.trim().to_uppercase();
        if let Some(asset) = self.upstream.get(&returned) {
            return Some(asset.clone());
        }
        let decoded = strategy_for(self.category).decode(&returned)?;
        self.upstream.values().find(|asset| **asset == decoded).cloned()
    }
}

/// Fetches current and historical rates for a set of asset tickers,
/// normalized to a reporting currency.
///
/// The gateway never fails. Fallback chain for current rates:
/// 1. Fresh cache entry for the exact (currency, ticker set) key.
/// 2. Provider, one request per asset category; a failing category only
///    leaves its own tickers unpriced.
/// 3. If every category failed: the most recent cached table for the same
///    reporting currency, whatever its age or ticker set.
/// 4. Otherwise: 1:1 parity for every requested ticker.
pub struct RateGateway {
    provider: Arc<dyn PriceProvider>,
    cache: RateCache,
    clock: Arc<dyn Clock>,
}

impl RateGateway {
    pub fn new(provider: Arc<dyn PriceProvider>, cache: RateCache, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            cache,
            clock,
        }
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Current rate table for `tickers`. Always contains the reporting
    /// currency at 1.
    pub async fn get_current_rates(
        &self,
        tickers: &BTreeSet<String>,
        reporting_currency: &str,
    ) -> RateTable {
        let reporting = reporting_currency.to_uppercase();
        let tickers: BTreeSet<String> = tickers.iter().map(|t| t.to_uppercase()).collect();
        let key = RateCacheKey::new(&reporting, &tickers);
        let now = self.clock.now();

        if let Some(table) = self.cache.get_fresh(&key, now) {
            tracing::debug!(currency = %reporting, tickers = tickers.len(), "Rate cache hit");
            return table.with_source(RateSource::Cached);
        }
        tracing::debug!(currency = %reporting, tickers = tickers.len(), "Rate cache miss");

        let requests = partition(&tickers, &reporting);
        let mut table = RateTable::new(&reporting);
        let mut failures = 0;

        for request in &requests {
            match self
                .provider
                .get_current_prices(&request.upstream_tickers(), &reporting)
                .await
            {
                Ok(quotes) => {
                    for quote in quotes {
                        let Some(asset) = request.resolve(&quote.ticker) else {
                            tracing::debug!(ticker = %quote.ticker, "Ignoring unrequested ticker in provider response");
                            continue;
                        };
                        let stored = Decimal::from_f64(quote.price)
                            .map(|price| table.insert_price(&asset, price))
                            .unwrap_or(false);
                        if !stored {
                            tracing::warn!(ticker = %asset, price = quote.price, "Ignoring unusable price");
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    tracing::warn!(
                        provider = self.provider.name(),
                        category = %request.category,
                        error = %e,
                        "Failed to fetch current prices for category"
                    );
                }
            }
        }

        if !requests.is_empty() && failures == requests.len() {
            return self.fallback(&tickers, &reporting);
        }

        // A partially priced table is served but not cached, so the missing
        // categories are retried on the next call.
        if failures == 0 {
            self.cache.insert(key, table.clone(), now);
        }
        table
    }

    fn fallback(&self, tickers: &BTreeSet<String>, reporting: &str) -> RateTable {
        if let Some(stale) = self.cache.latest_for_currency(reporting) {
            tracing::warn!(currency = %reporting, "Price provider unavailable; serving stale cached rates");
            return stale.with_source(RateSource::Stale);
        }
        tracing::warn!(currency = %reporting, "Price provider unavailable and nothing cached; assuming 1:1 parity");
        RateTable::parity(reporting, tickers)
    }

    /// Historical samples for `tickers` over `period`, in table convention
    /// and ordered by timestamp. Empty when the provider is unavailable.
    pub async fn get_historical_rates(
        &self,
        tickers: &BTreeSet<String>,
        reporting_currency: &str,
        period: Period,
        interval: Interval,
    ) -> Vec<HistoricalRate> {
        let reporting = reporting_currency.to_uppercase();
        let tickers: BTreeSet<String> = tickers.iter().map(|t| t.to_uppercase()).collect();
        let mut samples = Vec::new();

        for request in partition(&tickers, &reporting) {
            let quotes = match self
                .provider
                .get_historical_prices(&request.upstream_tickers(), &reporting, period, interval)
                .await
            {
                Ok(quotes) => quotes,
                Err(e) => {
                    tracing::warn!(
                        provider = self.provider.name(),
                        category = %request.category,
                        %period,
                        error = %e,
                        "Failed to fetch historical prices for category"
                    );
                    continue;
                }
            };

            for quote in quotes {
                let Some(asset) = request.resolve(&quote.ticker) else {
                    continue;
                };
                let rate = Decimal::from_f64(quote.price)
                    .filter(|price| *price > Decimal::ZERO)
                    .and_then(|price| Decimal::ONE.checked_div(price));
                match rate {
                    Some(rate) => samples.push(HistoricalRate {
                        ticker: asset,
                        timestamp: quote.timestamp,
                        rate,
                    }),
                    None => {
                        tracing::debug!(ticker = %asset, price = quote.price, "Skipping unusable historical price");
                    }
                }
            }
        }

        samples.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.ticker.cmp(&b.ticker)));
        samples
    }
}

/// Group tickers by category, skipping the reporting currency itself
/// (always 1) and encoding each for the provider.
fn partition(tickers: &BTreeSet<String>, reporting: &str) -> Vec<CategoryRequest> {
    let mut by_category: HashMap<AssetCategory, BTreeMap<String, String>> = HashMap::new();
    for ticker in tickers {
        if ticker == reporting {
            continue;
        }
        let category = AssetRegistry::category_of(ticker);
        let encoded = strategy_for(category).encode(ticker);
        by_category
            .entry(category)
            .or_default()
            .insert(encoded, ticker.clone());
    }

    AssetCategory::ALL
        .iter()
        .filter_map(|category| {
            by_category.remove(category).map(|upstream| CategoryRequest {
                category: *category,
                upstream,
            })
        })
        .collect()
}
