//! Market analyst: direct mode combines the technical and quantitative
//! engines over one shared bar fetch.

use super::{combine_results, finish_analyst_patch, mark_running, run_llm_driven_analyst};
use crate::context::{AgentContext, AnalystMode};
use async_trait::async_trait;
use graph_engine::{Node, NodeContext};
use quant_analysis::QuantAnalysisEngine;
use std::sync::Arc;
use std::time::Instant;
use technical_analysis::analyzer::TechnicalAnalysisEngine;
use trading_core::{AnalysisResult, AnalystKind, Blackboard, BlackboardPatch, NodeError};

const TECHNICAL_PERIOD_DAYS: i64 = 200;

pub struct MarketAnalyst {
    pub ctx: Arc<AgentContext>,
}

#[async_trait]
impl Node for MarketAnalyst {
    fn name(&self) -> &str {
        "market_analyst"
    }

    async fn run(&self, snapshot: &Blackboard, ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        mark_running(ctx, AnalystKind::Market);
        let start = Instant::now();
        let symbol = snapshot.company_of_interest.clone();
        let trade_date = snapshot.trade_date.clone();

        if self.ctx.config.market_mode == AnalystMode::Llm {
            let (report, tool_calls, messages) =
                run_llm_driven_analyst(&self.ctx, AnalystKind::Market, &symbol, &trade_date).await;
            let mut patch =
                finish_analyst_patch(ctx, AnalystKind::Market, start, tool_calls, true, Ok(report)).await;
            patch.market_messages = Some(messages);
            return Ok(patch);
        }

        let outcome = self.direct_report(&symbol).await;
        let mut patch = finish_analyst_patch(ctx, AnalystKind::Market, start, 0, false, outcome).await;
        patch.market_messages = Some(Vec::new());
        Ok(patch)
    }
}

impl MarketAnalyst {
    async fn direct_report(&self, symbol: &str) -> Result<String, String> {
        let record = self
            .ctx
            .technical
            .get(symbol, TECHNICAL_PERIOD_DAYS)
            .await
            .map_err(|e| format!("market analyst: {e}"))?;

        if record.bars.len() < 30 {
            return Err(format!(
                "market analyst: insufficient bar history for {symbol} ({} bars)",
                record.bars.len()
            ));
        }

        let technical = TechnicalAnalysisEngine::new()
            .analyze_enhanced(symbol, &record.bars)
            .map_err(|e| format!("market analyst technical engine: {e}"))?;
        let quant = QuantAnalysisEngine::new()
            .analyze_with_benchmark(symbol, &record.bars, None)
            .map_err(|e| format!("market analyst quant engine: {e}"))?;

        let results: Vec<AnalysisResult> = vec![technical.clone(), quant.clone()];
        let (signal, confidence) = combine_results(&results);

        Ok(format!(
            "Market Analysis for {symbol}\n\n\
             Technical: {} (confidence {:.0}%) — {}\n\
             Quantitative: {} (confidence {:.0}%) — {}\n\n\
             Combined signal: {} (confidence {:.0}%)\n\
             Latest close: {:.2}, SMA20={:?}, SMA50={:?}, RSI14={:?}, ATR14={:?}",
            technical.signal.to_label(),
            technical.confidence * 100.0,
            technical.reason,
            quant.signal.to_label(),
            quant.confidence * 100.0,
            quant.reason,
            signal.to_label(),
            confidence * 100.0,
            record.bars.last().map(|b| b.close).unwrap_or(0.0),
            record.sma_20,
            record.sma_50,
            record.rsi_14,
            record.atr_14,
        ))
    }
}
