use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;

/// How a whole [`RateTable`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    /// Fetched from the price provider just now.
    Live,
    /// Served from a cache entry younger than the TTL.
    Cached,
    /// Provider failed; served from the most recent cache entry for the
    /// same reporting currency regardless of age or ticker set.
    Stale,
    /// Provider failed and nothing was cached: every ticker is 1:1.
    Parity,
}

/// Snapshot of exchange rates anchored at the reporting currency.
///
/// Convention: `rate(T)` is the number of units of `T` worth one unit of
/// the reporting currency. The reporting currency is always present at
/// exactly 1 and is stored explicitly, never inferred from the values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    reporting_currency: String,
    rates: HashMap<String, Decimal>,
    source: RateSource,
}

impl RateTable {
    pub fn new(reporting_currency: impl Into<String>) -> Self {
        let reporting_currency = reporting_currency.into().to_uppercase();
        let mut rates = HashMap::new();
        rates.insert(reporting_currency.clone(), Decimal::ONE);
        Self {
            reporting_currency,
            rates,
            source: RateSource::Live,
        }
    }

    /// A degraded table: every requested ticker converts 1:1.
    pub fn parity<'a>(
        reporting_currency: &str,
        tickers: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        let mut table = Self::new(reporting_currency).with_source(RateSource::Parity);
        for ticker in tickers {
            table.insert(ticker, Decimal::ONE);
        }
        table
    }

    /// Build from a list of `(ticker, rate)` pairs already in table convention.
    pub fn from_rates<S: Into<String>>(
        reporting_currency: &str,
        rates: impl IntoIterator<Item = (S, Decimal)>,
    ) -> Self {
        let mut table = Self::new(reporting_currency);
        for (ticker, rate) in rates {
            table.insert(&ticker.into(), rate);
        }
        table
    }

    pub fn with_source(mut self, source: RateSource) -> Self {
        self.source = source;
        self
    }

    /// Insert or overwrite a rate. The reporting-currency anchor is fixed
    /// and cannot be overwritten.
    pub fn insert(&mut self, ticker: &str, rate: Decimal) {
        let key = ticker.to_uppercase();
        if key == self.reporting_currency {
            return;
        }
        self.rates.insert(key, rate);
    }

    /// Store a provider price ("reporting-currency units per 1 unit of
    /// `ticker`") by inverting it into table convention.
    /// Returns `false` for a zero or negative price, which is not stored.
    pub fn insert_price(&mut self, ticker: &str, price: Decimal) -> bool {
        if price <= Decimal::ZERO {
            return false;
        }
        match Decimal::ONE.checked_div(price) {
            Some(rate) => {
                self.insert(ticker, rate);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, ticker: &str) -> Option<Decimal> {
        self.rates.get(&ticker.to_uppercase()).copied()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.rates.contains_key(&ticker.to_uppercase())
    }

    pub fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    pub fn source(&self) -> RateSource {
        self.source
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.rates.iter()
    }
}

/// One historical sample from the provider, already in table convention
/// (units of `ticker` per unit of reporting currency).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRate {
    pub ticker: String,
    pub timestamp: DateTime<Utc>,
    pub rate: Decimal,
}

/// Requested chart period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "30d")]
    Days30,
    #[serde(rename = "180d")]
    Days180,
    #[serde(rename = "ytd")]
    YearToDate,
    #[serde(rename = "1y")]
    Year1,
    #[serde(rename = "5y")]
    Year5,
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// The code sent to the price provider's `period=` parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Days30 => "30d",
            Period::Days180 => "180d",
            Period::YearToDate => "ytd",
            Period::Year1 => "1y",
            Period::Year5 => "5y",
            Period::All => "all",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Period {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "30d" => Ok(Period::Days30),
            "180d" => Ok(Period::Days180),
            "ytd" => Ok(Period::YearToDate),
            "1y" => Ok(Period::Year1),
            "5y" => Ok(Period::Year5),
            "all" => Ok(Period::All),
            other => Err(CoreError::ValidationError(format!("Unknown period: {other}"))),
        }
    }
}

/// Sampling interval requested from the price provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1d")]
    Day1,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Hour1 => "1h",
            Interval::Hour4 => "4h",
            Interval::Day1 => "1d",
        }
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Interval {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1h" => Ok(Interval::Hour1),
            "4h" => Ok(Interval::Hour4),
            "1d" => Ok(Interval::Day1),
            other => Err(CoreError::ValidationError(format!("Unknown interval: {other}"))),
        }
    }
}
