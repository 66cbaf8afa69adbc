//! News analyst: direct mode runs the sentiment engine over Polygon's news
//! feed; an LLM-driven path is also supported.

use super::{finish_analyst_patch, mark_running, run_llm_driven_analyst};
use crate::context::{AgentContext, AnalystMode};
use async_trait::async_trait;
use graph_engine::{Node, NodeContext};
use sentiment_analysis::SentimentAnalysisEngine;
use std::sync::Arc;
use std::time::Instant;
use trading_core::{AnalystKind, Blackboard, BlackboardPatch, NodeError, SentimentAnalyzer};

const NEWS_LIMIT: u32 = 25;

pub struct NewsAnalyst {
    pub ctx: Arc<AgentContext>,
}

#[async_trait]
impl Node for NewsAnalyst {
    fn name(&self) -> &str {
        "news_analyst"
    }

    async fn run(&self, snapshot: &Blackboard, ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        mark_running(ctx, AnalystKind::News);
        let start = Instant::now();
        let symbol = snapshot.company_of_interest.clone();
        let trade_date = snapshot.trade_date.clone();

        if self.ctx.config.news_mode == AnalystMode::Llm {
            let (report, tool_calls, messages) =
                run_llm_driven_analyst(&self.ctx, AnalystKind::News, &symbol, &trade_date).await;
            let mut patch =
                finish_analyst_patch(ctx, AnalystKind::News, start, tool_calls, true, Ok(report)).await;
            patch.news_messages = Some(messages);
            return Ok(patch);
        }

        let outcome = self.direct_report(&symbol).await;
        let mut patch = finish_analyst_patch(ctx, AnalystKind::News, start, 0, false, outcome).await;
        patch.news_messages = Some(Vec::new());
        Ok(patch)
    }
}

impl NewsAnalyst {
    async fn direct_report(&self, symbol: &str) -> Result<String, String> {
        let articles = self
            .ctx
            .polygon
            .get_news(Some(symbol), NEWS_LIMIT)
            .await
            .map_err(|e| format!("news analyst: {e}"))?;

        if articles.is_empty() {
            return Err(format!("news analyst: no recent news found for {symbol}"));
        }

        let result = SentimentAnalysisEngine::new()
            .analyze(symbol, &articles)
            .await
            .map_err(|e| format!("news analyst engine: {e}"))?;

        let headlines = articles
            .iter()
            .take(8)
            .map(|a| format!("- {} ({})", a.title, a.published_utc.format("%Y-%m-%d")))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(format!(
            "News Analysis for {symbol}\n\n\
             Signal: {} (confidence {:.0}%)\n\
             {}\n\n\
             Recent headlines ({} articles analyzed):\n{headlines}",
            result.signal.to_label(),
            result.confidence * 100.0,
            result.reason,
            articles.len(),
        ))
    }
}
