use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::models::rates::{Interval, Period};

/// Latest price of one upstream ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Ticker in the provider's encoding (e.g. "EURUSD=X", "BTC-USD").
    pub ticker: String,
    /// Units of the requested currency per 1 unit of the asset.
    pub price: f64,
}

/// One historical sample of one upstream ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalQuote {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Seam between the rate gateway and whatever serves prices.
///
/// Tickers are passed and returned in the provider's own encoding; the
/// gateway owns translating asset tickers to and from it. Implementations
/// report failures as errors, the gateway decides how to degrade.
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Current price of each ticker in `currency`.
    async fn get_current_prices(
        &self,
        tickers: &[String],
        currency: &str,
    ) -> Result<Vec<Quote>, CoreError>;

    /// Price history of each ticker in `currency` over `period`, sampled at
    /// `interval`. Rows the provider could not interpret are left out.
    async fn get_historical_prices(
        &self,
        tickers: &[String],
        currency: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoricalQuote>, CoreError>;
}
