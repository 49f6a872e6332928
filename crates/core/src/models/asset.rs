use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// The category of a held asset.
/// Determines how its ticker is encoded for the price provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    /// Fiat currencies (USD, EUR, PLN, ...)
    Currency,
    /// Individual equities (AAPL, MSFT, ...)
    Stock,
    /// Exchange-traded funds (SPY, VWCE, ...)
    Etf,
    /// Cryptocurrencies (BTC, ETH, ...)
    Crypto,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::Currency,
        AssetCategory::Stock,
        AssetCategory::Etf,
        AssetCategory::Crypto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetCategory::Currency => "currency",
            AssetCategory::Stock => "stock",
            AssetCategory::Etf => "etf",
            AssetCategory::Crypto => "crypto",
        }
    }
}

impl std::fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssetCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "currency" => Ok(AssetCategory::Currency),
            "stock" => Ok(AssetCategory::Stock),
            "etf" => Ok(AssetCategory::Etf),
            "crypto" => Ok(AssetCategory::Crypto),
            other => Err(CoreError::ValidationError(format!(
                "Unknown asset category: {other}"
            ))),
        }
    }
}

/// Static catalog entry describing a known ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetInfo {
    /// Ticker, uppercased (e.g., "USD", "AAPL", "BTC")
    pub ticker: &'static str,
    /// Human-readable name (e.g., "US Dollar")
    pub name: &'static str,
    /// Display symbol (e.g., "$", "₿"); equals the ticker when there is none
    pub symbol: &'static str,
    pub category: AssetCategory,
}

/// Normalize a user-supplied ticker: trimmed and uppercased.
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}
