//! Crypto detection and the crypto-only fetch path.
//!
//! Before a symbol reaches the fundamentals collector it is tested against
//! a small crypto-ticker table and the `-USD` suffix convention. When
//! classified as crypto, the fundamentals collector swaps to
//! [`fetch_crypto_record`] instead of its normal 15-URL fan-out and the
//! stock-only fields of the resulting [`FundamentalsRecord`](crate::fundamentals::FundamentalsRecord)
//! stay `None`.

use crate::polygon::PolygonClient;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use trading_core::AnalysisError;

const KNOWN_CRYPTO_TICKERS: &[&str] = &[
    "BTC", "ETH", "SOL", "DOGE", "XRP", "ADA", "AVAX", "DOT", "MATIC", "LINK", "LTC", "BCH",
    "UNI", "ATOM", "XLM", "ALGO", "FIL", "AAVE", "SHIB", "TRX",
];

pub fn is_crypto_symbol(symbol: &str) -> bool {
    let upper = symbol.to_uppercase();
    let base = upper.strip_suffix("-USD").unwrap_or(&upper);
    KNOWN_CRYPTO_TICKERS.contains(&base) || upper.ends_with("-USD")
}

/// Normalizes a user-facing crypto symbol ("ETH", "ETH-USD") to Polygon's
/// `X:`-prefixed crypto ticker convention.
fn polygon_crypto_ticker(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    let base = upper.strip_suffix("-USD").unwrap_or(&upper);
    format!("X:{base}USD")
}

/// Crypto-shaped record: current price, 24h range/volume. This is the one
/// place where the current price is authoritative and must be passed to
/// any downstream reasoning agent to prevent the LLM from inventing a
/// stale number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CryptoRecord {
    pub symbol: String,
    pub current_price: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub volume_24h: f64,
    pub circulating_supply: Option<f64>,
    pub market_cap: Option<f64>,
}

pub async fn fetch_crypto_record(client: &PolygonClient, symbol: &str) -> Result<CryptoRecord, AnalysisError> {
    let ticker = polygon_crypto_ticker(symbol);
    let now = Utc::now();
    let bars = client.get_aggregates(&ticker, 1, "day", now - Duration::days(2), now).await?;

    let last = bars
        .last()
        .ok_or_else(|| AnalysisError::ApiError(format!("no crypto bars returned for {symbol}")))?;

    Ok(CryptoRecord {
        symbol: symbol.to_uppercase(),
        current_price: last.close,
        high_24h: last.high,
        low_24h: last.low,
        volume_24h: last.volume,
        circulating_supply: None,
        market_cap: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_tickers_and_usd_suffix() {
        assert!(is_crypto_symbol("ETH"));
        assert!(is_crypto_symbol("eth"));
        assert!(is_crypto_symbol("SOMECOIN-USD"));
        assert!(!is_crypto_symbol("NVDA"));
        assert!(!is_crypto_symbol("AAPL"));
    }

    #[test]
    fn normalizes_to_polygon_ticker_convention() {
        assert_eq!(polygon_crypto_ticker("ETH"), "X:ETHUSD");
        assert_eq!(polygon_crypto_ticker("eth-usd"), "X:ETHUSD");
    }
}
