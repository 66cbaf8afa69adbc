//! Technical-indicator / OHLCV collector.
//!
//! Fetches bars through the fallback chain and computes a battery of
//! indicators locally via the `technical-analysis` crate rather than an
//! upstream indicator API.

use crate::polygon::PolygonClient;
use crate::substrate::{Cache, CircuitBreaker, INDICATORS_TTL_SECS};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use technical_analysis::indicators::{adx, atr, bollinger_bands, ema, macd, obv, rsi, sma, stochastic, support_resistance, vwap};
use trading_core::{AnalysisError, Bar};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorsRecord {
    pub symbol: String,
    pub period_days: i64,
    pub bars: Vec<Bar>,
    pub sma_20: Option<f64>,
    pub sma_50: Option<f64>,
    pub ema_12: Option<f64>,
    pub ema_26: Option<f64>,
    pub rsi_14: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub bollinger_upper: Option<f64>,
    pub bollinger_lower: Option<f64>,
    pub atr_14: Option<f64>,
    pub stochastic_k: Option<f64>,
    pub stochastic_d: Option<f64>,
    pub obv: Option<f64>,
    pub adx_14: Option<f64>,
    pub vwap: Option<f64>,
    pub resistance: Option<f64>,
    pub support: Option<f64>,
}

pub struct TechnicalCollector {
    client: Arc<PolygonClient>,
    cache: Cache,
    breaker: CircuitBreaker,
}

impl TechnicalCollector {
    pub fn new(client: Arc<PolygonClient>, cache: Cache) -> Self {
        Self { client, cache, breaker: CircuitBreaker::new() }
    }

    pub async fn get(&self, symbol: &str, period_days: i64) -> Result<IndicatorsRecord, AnalysisError> {
        let cache_key = format!(
            "tech:{}:{}:{}",
            symbol.to_uppercase(),
            Utc::now().format("%Y-%m-%d"),
            period_days
        );
        if let Some(cached) = self.cache.get(&cache_key).await {
            if let Ok(record) = serde_json::from_str::<IndicatorsRecord>(&cached) {
                return Ok(record);
            }
        }

        if !self.breaker.allow() {
            return Err(AnalysisError::ApiError(format!("circuit open for technical upstream ({symbol})")));
        }

        let now = Utc::now();
        let bars = match self.client.get_aggregates(symbol, 1, "day", now - Duration::days(period_days), now).await {
            Ok(bars) => {
                self.breaker.record_success();
                bars
            }
            Err(e) => {
                self.breaker.record_failure();
                return Err(e);
            }
        };

        let record = compute_indicators(symbol, period_days, bars);

        if let Ok(json) = serde_json::to_string(&record) {
            self.cache.set_ex(&cache_key, &json, INDICATORS_TTL_SECS).await;
        }

        Ok(record)
    }
}

/// Each indicator is only computed when there are sufficient data points.
fn compute_indicators(symbol: &str, period_days: i64, bars: Vec<Bar>) -> IndicatorsRecord {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let last_n: Vec<Bar> = bars.iter().rev().take(200).rev().cloned().collect();

    let sma_20 = (closes.len() >= 20).then(|| sma(&closes, 20)).and_then(|v| v.last().copied());
    let sma_50 = (closes.len() >= 50).then(|| sma(&closes, 50)).and_then(|v| v.last().copied());
    let ema_12 = (closes.len() >= 12).then(|| ema(&closes, 12)).and_then(|v| v.last().copied());
    let ema_26 = (closes.len() >= 26).then(|| ema(&closes, 26)).and_then(|v| v.last().copied());
    let rsi_14 = (closes.len() >= 15).then(|| rsi(&closes, 14)).and_then(|v| v.last().copied());

    let (macd_val, macd_signal, macd_hist) = if closes.len() >= 35 {
        let result = macd(&closes, 12, 26, 9);
        (
            result.macd_line.last().copied(),
            result.signal_line.last().copied(),
            result.histogram.last().copied(),
        )
    } else {
        (None, None, None)
    };

    let (bollinger_upper, bollinger_lower) = if closes.len() >= 20 {
        let bands = bollinger_bands(&closes, 20, 2.0);
        (bands.upper.last().copied(), bands.lower.last().copied())
    } else {
        (None, None)
    };

    let atr_14 = (bars.len() >= 15).then(|| atr(&bars, 14)).and_then(|v| v.last().copied());

    let (stochastic_k, stochastic_d) = if bars.len() >= 14 {
        let result = stochastic(&bars, 14, 3);
        (result.k.last().copied(), result.d.last().copied())
    } else {
        (None, None)
    };

    let obv_value = (!bars.is_empty()).then(|| obv(&bars)).and_then(|v| v.last().copied());
    let adx_14 = (bars.len() >= 28).then(|| adx(&bars, 14)).and_then(|r| r.adx.last().copied());
    let vwap_value = (!bars.is_empty()).then(|| vwap(&bars)).and_then(|v| v.last().copied());

    let (resistance, support) = if bars.len() >= 5 {
        let lookback = if bars.len() >= 20 { 20 } else { 5 };
        let sr = support_resistance(&bars, lookback);
        (sr.resistance, sr.support)
    } else {
        (None, None)
    };

    IndicatorsRecord {
        symbol: symbol.to_uppercase(),
        period_days,
        bars: last_n,
        sma_20,
        sma_50,
        ema_12,
        ema_26,
        rsi_14,
        macd: macd_val,
        macd_signal,
        macd_histogram: macd_hist,
        bollinger_upper,
        bollinger_lower,
        atr_14,
        stochastic_k,
        stochastic_d,
        obv: obv_value,
        adx_14,
        vwap: vwap_value,
        resistance,
        support,
    }
}
