use crate::models::asset::{normalize_ticker, AssetCategory, AssetInfo};

const fn currency(ticker: &'static str, name: &'static str, symbol: &'static str) -> AssetInfo {
    AssetInfo {
        ticker,
        name,
        symbol,
        category: AssetCategory::Currency,
    }
}

const fn stock(ticker: &'static str, name: &'static str) -> AssetInfo {
    AssetInfo {
        ticker,
        name,
        symbol: ticker,
        category: AssetCategory::Stock,
    }
}

const fn etf(ticker: &'static str, name: &'static str) -> AssetInfo {
    AssetInfo {
        ticker,
        name,
        symbol: ticker,
        category: AssetCategory::Etf,
    }
}

const fn crypto(ticker: &'static str, name: &'static str, symbol: &'static str) -> AssetInfo {
    AssetInfo {
        ticker,
        name,
        symbol,
        category: AssetCategory::Crypto,
    }
}

static CATALOG: &[AssetInfo] = &[
    // Currencies
    currency("USD", "US Dollar", "$"),
    currency("EUR", "Euro", "€"),
    currency("GBP", "British Pound", "£"),
    currency("PLN", "Polish Zloty", "zł"),
    currency("CHF", "Swiss Franc", "CHF"),
    currency("JPY", "Japanese Yen", "¥"),
    currency("CNY", "Chinese Yuan", "¥"),
    currency("CAD", "Canadian Dollar", "C$"),
    currency("AUD", "Australian Dollar", "A$"),
    currency("NZD", "New Zealand Dollar", "NZ$"),
    currency("SEK", "Swedish Krona", "kr"),
    currency("NOK", "Norwegian Krone", "kr"),
    currency("DKK", "Danish Krone", "kr"),
    currency("CZK", "Czech Koruna", "Kč"),
    currency("HUF", "Hungarian Forint", "Ft"),
    currency("UAH", "Ukrainian Hryvnia", "₴"),
    currency("TRY", "Turkish Lira", "₺"),
    currency("INR", "Indian Rupee", "₹"),
    currency("BRL", "Brazilian Real", "R$"),
    currency("MXN", "Mexican Peso", "MX$"),
    currency("KRW", "South Korean Won", "₩"),
    currency("SGD", "Singapore Dollar", "S$"),
    currency("HKD", "Hong Kong Dollar", "HK$"),
    currency("ZAR", "South African Rand", "R"),
    // Stocks
    stock("AAPL", "Apple Inc."),
    stock("MSFT", "Microsoft Corporation"),
    stock("GOOGL", "Alphabet Inc."),
    stock("AMZN", "Amazon.com, Inc."),
    stock("NVDA", "NVIDIA Corporation"),
    stock("META", "Meta Platforms, Inc."),
    stock("TSLA", "Tesla, Inc."),
    stock("BRK-B", "Berkshire Hathaway Inc."),
    stock("JPM", "JPMorgan Chase & Co."),
    stock("V", "Visa Inc."),
    stock("KO", "The Coca-Cola Company"),
    stock("NFLX", "Netflix, Inc."),
    // ETFs
    etf("SPY", "SPDR S&P 500 ETF Trust"),
    etf("VOO", "Vanguard S&P 500 ETF"),
    etf("VTI", "Vanguard Total Stock Market ETF"),
    etf("QQQ", "Invesco QQQ Trust"),
    etf("VXUS", "Vanguard Total International Stock ETF"),
    etf("BND", "Vanguard Total Bond Market ETF"),
    etf("IWDA.AS", "iShares Core MSCI World UCITS ETF"),
    etf("VWCE.DE", "Vanguard FTSE All-World UCITS ETF"),
    etf("GLD", "SPDR Gold Shares"),
    // Crypto
    crypto("BTC", "Bitcoin", "₿"),
    crypto("ETH", "Ethereum", "Ξ"),
    crypto("SOL", "Solana", "SOL"),
    crypto("XRP", "XRP", "XRP"),
    crypto("ADA", "Cardano", "ADA"),
    crypto("DOGE", "Dogecoin", "Ð"),
    crypto("DOT", "Polkadot", "DOT"),
    crypto("LTC", "Litecoin", "Ł"),
    crypto("USDT", "Tether", "USDT"),
    crypto("USDC", "USD Coin", "USDC"),
];

/// Static, read-only catalog of known tickers.
///
/// Lookups never fail: an unrecognized ticker is treated as a currency,
/// so a user can hold any ISO code the catalog does not list.
pub struct AssetRegistry;

impl AssetRegistry {
    /// Catalog entry for a ticker (case-insensitive), if known.
    pub fn lookup(ticker: &str) -> Option<&'static AssetInfo> {
        let wanted = normalize_ticker(ticker);
        CATALOG.iter().find(|info| info.ticker == wanted)
    }

    /// Category of a ticker, `Currency` when unknown.
    pub fn category_of(ticker: &str) -> AssetCategory {
        Self::lookup(ticker)
            .map(|info| info.category)
            .unwrap_or(AssetCategory::Currency)
    }

    /// Human-readable name, falling back to the normalized ticker.
    pub fn display_name(ticker: &str) -> String {
        Self::lookup(ticker)
            .map(|info| info.name.to_string())
            .unwrap_or_else(|| normalize_ticker(ticker))
    }

    /// Display symbol, falling back to the normalized ticker.
    pub fn symbol(ticker: &str) -> String {
        Self::lookup(ticker)
            .map(|info| info.symbol.to_string())
            .unwrap_or_else(|| normalize_ticker(ticker))
    }

    /// All catalog entries of one category, in catalog order.
    pub fn list(category: AssetCategory) -> Vec<&'static AssetInfo> {
        CATALOG.iter().filter(|info| info.category == category).collect()
    }
}
