use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use super::traits::{HistoricalQuote, PriceProvider, Quote};
use crate::config::TrackerConfig;
use crate::errors::CoreError;
use crate::models::rates::{Interval, Period};

const PROVIDER_NAME: &str = "Price API";

/// HTTP client for the price/rate service.
///
/// - `GET {base}/prices/current?tickers=..&tickers=..&currency=..`
/// - `GET {base}/prices/historical?tickers=..&currency=..&period=..&interval=..`
///
/// Both return a JSON array. Individual rows that cannot be interpreted are
/// dropped here; a non-2xx status or a body that is not an array fails the
/// whole request.
pub struct PriceApiProvider {
    client: Client,
    base_url: String,
}

impl PriceApiProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self, CoreError> {
        Self::new(
            config.price_api_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Use a preconfigured client (custom TLS, proxies, test servers).
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_rows(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Value>, CoreError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.client.get(&url).query(query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("{path} returned HTTP {status}"),
            });
        }

        let body: Value = resp.json().await.map_err(|e| CoreError::Api {
            provider: PROVIDER_NAME.into(),
            message: format!("Failed to parse {path} response: {e}"),
        })?;

        match body {
            Value::Array(rows) => Ok(rows),
            other => Err(CoreError::Api {
                provider: PROVIDER_NAME.into(),
                message: format!("Expected a JSON array from {path}, got {}", json_kind(&other)),
            }),
        }
    }
}

fn ticker_query(tickers: &[String], currency: &str) -> Vec<(&'static str, String)> {
    let mut query: Vec<(&str, String)> = tickers
        .iter()
        .map(|t| ("tickers", t.clone()))
        .collect();
    query.push(("currency", currency.to_uppercase()));
    query
}

// ── Price API response rows ─────────────────────────────────────────

#[derive(Deserialize)]
struct CurrentRow {
    ticker: Option<String>,
    #[serde(default)]
    price: Value,
}

#[derive(Deserialize)]
struct HistoricalRow {
    ticker: Option<String>,
    #[serde(default)]
    date: Value,
    #[serde(default)]
    timestamp: Value,
    #[serde(default)]
    close: Value,
    #[serde(default)]
    price: Value,
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Read a price that may arrive as a JSON number or a numeric string.
fn value_as_f64(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Normalize a sample time. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DD` (midnight UTC) and unix seconds or milliseconds.
pub fn parse_sample_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let raw = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            // Anything past year ~33658 in seconds is really milliseconds.
            let secs = if raw.abs() >= 1_000_000_000_000 { raw / 1000 } else { raw };
            DateTime::from_timestamp(secs, 0)
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(ndt.and_utc());
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc())
        }
        _ => None,
    }
}

fn parse_historical_row(row: HistoricalRow) -> Option<HistoricalQuote> {
    let ticker = row.ticker.filter(|t| !t.trim().is_empty())?;
    let timestamp = parse_sample_timestamp(&row.timestamp).or_else(|| parse_sample_timestamp(&row.date))?;
    let price = value_as_f64(&row.close).or_else(|| value_as_f64(&row.price))?;
    Some(HistoricalQuote {
        ticker,
        timestamp,
        price,
    })
}

#[async_trait]
impl PriceProvider for PriceApiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn get_current_prices(
        &self,
        tickers: &[String],
        currency: &str,
    ) -> Result<Vec<Quote>, CoreError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .get_rows("/prices/current", &ticker_query(tickers, currency))
            .await?;

        let quotes = rows
            .into_iter()
            .filter_map(|raw| {
                let row: CurrentRow = match serde_json::from_value(raw) {
                    Ok(row) => row,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unreadable current price row");
                        return None;
                    }
                };
                let ticker = row.ticker.filter(|t| !t.trim().is_empty())?;
                match value_as_f64(&row.price) {
                    Some(price) => Some(Quote { ticker, price }),
                    None => {
                        tracing::warn!(%ticker, "Skipping current price row without a usable price");
                        None
                    }
                }
            })
            .collect();

        Ok(quotes)
    }

    async fn get_historical_prices(
        &self,
        tickers: &[String],
        currency: &str,
        period: Period,
        interval: Interval,
    ) -> Result<Vec<HistoricalQuote>, CoreError> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = ticker_query(tickers, currency);
        query.push(("period", period.as_str().to_string()));
        query.push(("interval", interval.as_str().to_string()));

        let rows = self.get_rows("/prices/historical", &query).await?;
        let total = rows.len();

        let samples: Vec<HistoricalQuote> = rows
            .into_iter()
            .filter_map(|raw| serde_json::from_value::<HistoricalRow>(raw).ok())
            .filter_map(parse_historical_row)
            .collect();

        if samples.len() < total {
            tracing::warn!(
                skipped = total - samples.len(),
                total,
                "Skipped malformed historical price rows"
            );
        }

        Ok(samples)
    }
}
