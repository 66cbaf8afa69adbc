//! Fundamentals analyst: direct mode runs the consensus-blended fundamental
//! engine over the fundamentals collector's record.

use super::{finish_analyst_patch, mark_running, run_llm_driven_analyst};
use crate::context::{AgentContext, AnalystMode};
use async_trait::async_trait;
use fundamental_analysis::FundamentalAnalysisEngine;
use graph_engine::{Node, NodeContext};
use std::sync::Arc;
use std::time::Instant;
use trading_core::{AnalystKind, Blackboard, BlackboardPatch, NodeError};

pub struct FundamentalsAnalyst {
    pub ctx: Arc<AgentContext>,
}

#[async_trait]
impl Node for FundamentalsAnalyst {
    fn name(&self) -> &str {
        "fundamentals_analyst"
    }

    async fn run(&self, snapshot: &Blackboard, ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        mark_running(ctx, AnalystKind::Fundamentals);
        let start = Instant::now();
        let symbol = snapshot.company_of_interest.clone();
        let trade_date = snapshot.trade_date.clone();

        if self.ctx.config.fundamentals_mode == AnalystMode::Llm {
            let (report, tool_calls, messages) =
                run_llm_driven_analyst(&self.ctx, AnalystKind::Fundamentals, &symbol, &trade_date).await;
            let mut patch =
                finish_analyst_patch(ctx, AnalystKind::Fundamentals, start, tool_calls, true, Ok(report))
                    .await;
            patch.fundamentals_messages = Some(messages);
            return Ok(patch);
        }

        let outcome = self.direct_report(&symbol).await;
        let mut patch = finish_analyst_patch(ctx, AnalystKind::Fundamentals, start, 0, false, outcome).await;
        patch.fundamentals_messages = Some(Vec::new());
        Ok(patch)
    }
}

impl FundamentalsAnalyst {
    async fn direct_report(&self, symbol: &str) -> Result<String, String> {
        let record = self
            .ctx
            .fundamentals
            .get(symbol)
            .await
            .map_err(|e| format!("fundamentals analyst: {e}"))?;

        if let Some(crypto) = &record.crypto {
            return Ok(format!(
                "Fundamentals Analysis for {symbol}\n\n\
                 {symbol} trades as a crypto asset; no equity fundamentals apply.\n\
                 Current price: {:.2}, 24h range: {:.2}-{:.2}, 24h volume: {:.0}",
                crypto.current_price, crypto.low_24h, crypto.high_24h, crypto.volume_24h
            ));
        }

        if record.financials.is_empty() {
            return Err(format!(
                "fundamentals analyst: no financial statements available for {symbol} \
                 ({}/{} endpoints fetched)",
                record.endpoints_fetched, record.endpoints_total
            ));
        }

        let result = FundamentalAnalysisEngine::new()
            .analyze_with_consensus(
                symbol,
                &record.financials,
                record.current_price,
                None,
                &record.analyst_consensus,
                None,
            )
            .map_err(|e| format!("fundamentals analyst engine: {e}"))?;

        let targets = record
            .price_targets
            .as_ref()
            .map(|t| {
                format!(
                    "price target mean {:.2} (range {:.2}-{:.2}, {} analysts, {:?} confidence, source: {})",
                    t.target_mean, t.target_low, t.target_high, t.number_of_analysts, t.confidence, t.source
                )
            })
            .unwrap_or_else(|| "no price target available".to_string());

        Ok(format!(
            "Fundamentals Analysis for {symbol}\n\n\
             Signal: {} (confidence {:.0}%)\n\
             {}\n\n\
             {targets}\n\
             Endpoints fetched: {}/{}",
            result.signal.to_label(),
            result.confidence * 100.0,
            result.reason,
            record.endpoints_fetched,
            record.endpoints_total,
        ))
    }
}
