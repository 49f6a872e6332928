//! Per-category ticker encoding used by the price provider.
//!
//! The provider follows Yahoo-style symbols: currencies are quoted as a
//! pair against USD (`EURUSD=X`), crypto as a dash pair (`BTC-USD`) and
//! equities/ETFs by their bare symbol.

use crate::models::asset::AssetCategory;

/// Encode/decode pair for one asset category.
#[derive(Debug, Clone, Copy)]
pub struct TickerEncoding {
    pub category: AssetCategory,
    pub encode: fn(&str) -> String,
    /// `None` when the upstream ticker does not follow this category's scheme.
    pub decode: fn(&str) -> Option<String>,
}

impl TickerEncoding {
    pub fn encode(&self, ticker: &str) -> String {
        (self.encode)(ticker)
    }

    pub fn decode(&self, upstream: &str) -> Option<String> {
        (self.decode)(upstream)
    }
}

const CURRENCY_SUFFIX: &str = "USD=X";
const CRYPTO_SUFFIX: &str = "-USD";

fn encode_currency(ticker: &str) -> String {
    format!("{}{CURRENCY_SUFFIX}", ticker.trim().to_uppercase())
}

fn decode_currency(upstream: &str) -> Option<String> {
    upstream
        .trim()
        .to_uppercase()
        .strip_suffix(CURRENCY_SUFFIX)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

fn encode_crypto(ticker: &str) -> String {
    format!("{}{CRYPTO_SUFFIX}", ticker.trim().to_uppercase())
}

fn decode_crypto(upstream: &str) -> Option<String> {
    upstream
        .trim()
        .to_uppercase()
        .strip_suffix(CRYPTO_SUFFIX)
        .filter(|code| !code.is_empty())
        .map(str::to_string)
}

fn encode_bare(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

fn decode_bare(upstream: &str) -> Option<String> {
    let ticker = upstream.trim().to_uppercase();
    (!ticker.is_empty()).then_some(ticker)
}

static STRATEGIES: [TickerEncoding; 4] = [
    TickerEncoding {
        category: AssetCategory::Currency,
        encode: encode_currency,
        decode: decode_currency,
    },
    TickerEncoding {
        category: AssetCategory::Stock,
        encode: encode_bare,
        decode: decode_bare,
    },
    TickerEncoding {
        category: AssetCategory::Etf,
        encode: encode_bare,
        decode: decode_bare,
    },
    TickerEncoding {
        category: AssetCategory::Crypto,
        encode: encode_crypto,
        decode: decode_crypto,
    },
];

/// Look up the encoding strategy for a category.
pub fn strategy_for(category: AssetCategory) -> &'static TickerEncoding {
    match category {
        AssetCategory::Currency => &STRATEGIES[0],
        AssetCategory::Stock => &STRATEGIES[1],
        AssetCategory::Etf => &STRATEGIES[2],
        AssetCategory::Crypto => &STRATEGIES[3],
    }
}
