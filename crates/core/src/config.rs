use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Longest accepted rate cache TTL: one year.
pub const MAX_RATE_CACHE_TTL_HOURS: i64 = 24 * 366;

/// Runtime configuration for a tracker instance.
///
/// Every field has a default so a partial JSON document is enough:
/// `{"price_api_url": "https://prices.internal"}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL of the price/rate service (without the `/prices/...` path).
    pub price_api_url: String,

    /// Per-request timeout for the price service, in seconds.
    pub request_timeout_secs: u64,

    /// How long a current-rates table is served from cache before refetching.
    pub rate_cache_ttl_hours: i64,

    /// Reporting currency used for users who have not saved a profile yet.
    pub default_currency: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            price_api_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            rate_cache_ttl_hours: 24,
            default_currency: "USD".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Parse a config from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: TrackerConfig =
            serde_json::from_str(json).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.price_api_url.trim().is_empty() {
            return Err(CoreError::Config("price_api_url must not be empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.rate_cache_ttl_hours <= 0 {
            return Err(CoreError::Config(
                "rate_cache_ttl_hours must be greater than zero".into(),
            ));
        }
        if self.rate_cache_ttl_hours > MAX_RATE_CACHE_TTL_HOURS {
            return Err(CoreError::Config(format!(
                "rate_cache_ttl_hours must be at most {MAX_RATE_CACHE_TTL_HOURS}, got {}",
                self.rate_cache_ttl_hours
            )));
        }
        if self.default_currency.trim().is_empty() {
            return Err(CoreError::Config("default_currency must not be empty".into()));
        }
        Ok(())
    }

    /// The cache TTL, clamped to the accepted range so an unvalidated
    /// config cannot overflow `chrono::Duration`.
    pub fn rate_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.rate_cache_ttl_hours.clamp(0, MAX_RATE_CACHE_TTL_HOURS))
    }
}
