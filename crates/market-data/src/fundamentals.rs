//! Fundamentals collector: one normalized record per symbol assembled from
//! many independent upstream facets fetched in parallel. Per-facet failures
//! never abort the record.

use crate::crypto::{fetch_crypto_record, is_crypto_symbol, CryptoRecord};
use crate::polygon::{DividendInfo, InsiderTransaction, PolygonClient};
use crate::substrate::{Cache, CircuitBreaker, FUNDAMENTALS_TTL_SECS};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use trading_core::{AnalysisError, AnalystConsensusData, AnalystRating, Financials};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceTargetConfidence {
    High,
    Medium,
    Low,
    Limited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTargets {
    pub number_of_analysts: i32,
    pub target_mean: f64,
    pub target_high: f64,
    pub target_low: f64,
    pub confidence: PriceTargetConfidence,
    pub source: String,
}

/// Normalized record covering 15 fundamentals facets.
/// Facets Polygon has no direct equivalent for (earnings calendar, revenue
/// estimates, institutional ownership, splits, peers) stay `None` and count
/// against `endpoints_fetched` like any other failed fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundamentalsRecord {
    pub symbol: String,
    pub company_name: Option<String>,
    pub current_price: Option<f64>,
    pub financials: Vec<Financials>,
    pub dividends: Vec<DividendInfo>,
    pub insider_transactions: Vec<InsiderTransaction>,
    pub analyst_consensus: AnalystConsensusData,
    pub price_targets: Option<PriceTargets>,
    pub crypto: Option<CryptoRecord>,
    pub endpoints_fetched: u32,
    pub endpoints_total: u32,
}

const ENDPOINTS_TOTAL: u32 = 15;

pub struct FundamentalsCollector {
    client: Arc<PolygonClient>,
    cache: Cache,
    breaker: CircuitBreaker,
}

impl FundamentalsCollector {
    pub fn new(client: Arc<PolygonClient>, cache: Cache) -> Self {
        Self { client, cache, breaker: CircuitBreaker::new() }
    }

    pub async fn get(&self, symbol: &str) -> Result<FundamentalsRecord, AnalysisError> {
        if is_crypto_symbol(symbol) {
            let crypto = fetch_crypto_record(&self.client, symbol).await?;
            return Ok(FundamentalsRecord {
                symbol: symbol.to_uppercase(),
                company_name: None,
                current_price: Some(crypto.current_price),
                financials: Vec::new(),
                dividends: Vec::new(),
                insider_transactions: Vec::new(),
                analyst_consensus: AnalystConsensusData::default(),
                price_targets: None,
                crypto: Some(crypto),
                endpoints_fetched: 1,
                endpoints_total: ENDPOINTS_TOTAL,
            });
        }

        let cache_key = format!("fund:{}:{}", symbol.to_uppercase(), Utc::now().format("%Y-%m-%d"));
        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(record) = serde_json::from_str::<FundamentalsRecord>(&cached) {
                return Ok(record);
            }
        }

        if !self.breaker.allow() {
            return Err(AnalysisError::ApiError(format!("circuit open for fundamentals upstream ({symbol})")));
        }

        let (details, financials, dividends, insider, consensus, ratings) = tokio::join!(
            self.client.get_ticker_details(symbol),
            self.client.get_financials(symbol),
            self.client.get_dividends(symbol, 20),
            self.client.get_insider_transactions(symbol, 50),
            self.client.get_consensus_ratings(symbol),
            self.client.get_analyst_ratings(symbol, 20),
        );

        let mut endpoints_fetched = 0u32;
        let company_name = details.as_ref().ok().map(|d| d.name.clone());
        if details.is_ok() {
            endpoints_fetched += 1;
            self.breaker.record_success();
        } else {
            self.breaker.record_failure();
        }

        let financials = financials.unwrap_or_else(|_| {
            self.breaker.record_failure();
            Vec::new()
        });
        if !financials.is_empty() {
            endpoints_fetched += 3; // balance sheet + income + cash flow facets in one payload
        }

        let dividends = dividends.unwrap_or_default();
        if !dividends.is_empty() {
            endpoints_fetched += 1;
        }

        let insider_transactions = insider.unwrap_or_default();
        if !insider_transactions.is_empty() {
            endpoints_fetched += 1;
        }

        let consensus = consensus.unwrap_or(None);
        if consensus.is_some() {
            endpoints_fetched += 1;
        }

        let recent_ratings = ratings.unwrap_or_default();
        if !recent_ratings.is_empty() {
            endpoints_fetched += 1;
        }

        let current_price = financials.first().and_then(|_| None); // Polygon financials don't carry spot price
        let price_targets = build_price_targets(&consensus, &recent_ratings, current_price);
        if price_targets.is_some() {
            endpoints_fetched += 1;
        }

        let record = FundamentalsRecord {
            symbol: symbol.to_uppercase(),
            company_name,
            current_price,
            financials,
            dividends,
            insider_transactions,
            analyst_consensus: AnalystConsensusData { consensus, recent_ratings },
            price_targets,
            crypto: None,
            endpoints_fetched,
            endpoints_total: ENDPOINTS_TOTAL,
        };

        if let Ok(json) = serde_json::to_string(&record) {
            self.cache.set_ex(&cache_key, &json, FUNDAMENTALS_TTL_SECS).await;
        }

        Ok(record)
    }
}

/// Price-target enhancement: if the primary upstream returns no price
/// target, derive one from the analyst-recommendation tally by classifying
/// majority direction and applying a direction-specific offset to the
/// current price.
fn build_price_targets(
    consensus: &Option<trading_core::ConsensusRating>,
    recent_ratings: &[AnalystRating],
    current_price: Option<f64>,
) -> Option<PriceTargets> {
    if let Some(c) = consensus {
        let number_of_analysts = c.contributors.unwrap_or(0);
        let target_mean = c.consensus_price_target.unwrap_or(0.0);
        if number_of_analysts > 0 && target_mean != 0.0 {
            return Some(PriceTargets {
                number_of_analysts,
                target_mean,
                target_high: c.high_price_target.unwrap_or(target_mean),
                target_low: c.low_price_target.unwrap_or(target_mean),
                confidence: if number_of_analysts >= 10 {
                    PriceTargetConfidence::High
                } else if number_of_analysts >= 4 {
                    PriceTargetConfidence::Medium
                } else {
                    PriceTargetConfidence::Low
                },
                source: "Analyst Consensus".to_string(),
            });
        }
    }

    let price = current_price?;
    if recent_ratings.is_empty() {
        return None;
    }

    let bullish = recent_ratings
        .iter()
        .filter(|r| matches!(r.rating.as_deref(), Some("Buy") | Some("Strong Buy") | Some("Overweight")))
        .count();
    let bearish = recent_ratings
        .iter()
        .filter(|r| matches!(r.rating.as_deref(), Some("Sell") | Some("Strong Sell") | Some("Underweight")))
        .count();
    let total = recent_ratings.len().max(1);
    let bullish_ratio = bullish as f64 / total as f64;
    let bearish_ratio = bearish as f64 / total as f64;

    let offset = if bullish_ratio >= 0.66 {
        0.20
    } else if bullish_ratio >= 0.5 {
        0.10
    } else if bearish_ratio >= 0.5 {
        -0.05
    } else {
        0.05
    };

    let target_mean = price * (1.0 + offset);
    Some(PriceTargets {
        number_of_analysts: total as i32,
        target_mean,
        target_high: target_mean * 1.10,
        target_low: target_mean * 0.90,
        confidence: PriceTargetConfidence::Limited,
        source: "Analyst Recommendations (Derived)".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_bullish_target_from_majority_buy_ratings() {
        let ratings = vec![
            AnalystRating { price_target: None, rating: Some("Buy".into()), rating_action: None, analyst: None, firm: None, date: None };
            3
        ];
        let targets = build_price_targets(&None, &ratings, Some(100.0)).unwrap();
        assert_eq!(targets.source, "Analyst Recommendations (Derived)");
        assert!((targets.target_mean - 120.0).abs() < 1e-6);
        assert_eq!(targets.confidence, PriceTargetConfidence::Limited);
    }

    #[test]
    fn returns_none_without_price_or_ratings() {
        assert!(build_price_targets(&None, &[], None).is_none());
    }
}
