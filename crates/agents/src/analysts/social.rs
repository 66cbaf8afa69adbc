//! Social analyst: tool selection is not delegated to the LLM. Reddit,
//! Twitter, and StockTwits are always fetched concurrently; their
//! normalized outputs are handed to the LLM for synthesis only, guaranteeing
//! uniform coverage independent of LLM tool choice.

use super::{finish_analyst_patch, mark_running};
use crate::context::AgentContext;
use async_trait::async_trait;
use graph_engine::{Node, NodeContext};
use llm_client::{LlmMessage, ToolExecutor};
use std::sync::Arc;
use std::time::Instant;
use trading_core::{AgentMessage, AnalystKind, Blackboard, BlackboardPatch, NodeError};
use uuid::Uuid;

pub struct SocialAnalyst {
    pub ctx: Arc<AgentContext>,
}

#[async_trait]
impl Node for SocialAnalyst {
    fn name(&self) -> &str {
        "social_analyst"
    }

    async fn run(&self, snapshot: &Blackboard, ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        mark_running(ctx, AnalystKind::Social);
        let start = Instant::now();
        let symbol = snapshot.company_of_interest.clone();

        let (reddit, twitter, stocktwits) = tokio::join!(
            self.ctx.tools.execute("get_reddit_news", &serde_json::json!({ "symbol": symbol })),
            self.ctx.tools.execute("get_twitter_mentions", &serde_json::json!({ "symbol": symbol })),
            self.ctx.tools.execute("get_stocktwits_sentiment", &serde_json::json!({ "symbol": symbol })),
        );
        let tool_calls_made = 3u32;

        let formatted = format!(
            "Reddit: {}\n\nTwitter/X: {}\n\nStockTwits: {}",
            reddit.content, twitter.content, stocktwits.content
        );

        let prompt = format!(
            "You are the social media analyst for {symbol}. Below is data collected \
             from all three social platforms.\n\n{formatted}\n\n\
             Based on the above, provide a comprehensive social sentiment report with a \
             clear directional view."
        );

        let mut log = vec![AgentMessage::tool_result(
            Uuid::new_v4().to_string(),
            "social_sources".to_string(),
            formatted,
        )];

        let outcome = self
            .ctx
            .llm
            .chat(&[LlmMessage::user(prompt.clone())], &[])
            .await;

        let report = match outcome {
            Ok(response) => {
                let content = response.content.unwrap_or_default();
                log.push(AgentMessage::assistant(Uuid::new_v4().to_string(), content.clone()));
                if content.trim().is_empty() {
                    Err(format!("social analyst: LLM returned no synthesis for {symbol}"))
                } else {
                    Ok(content)
                }
            }
            Err(e) => Err(format!("social analyst: LLM call failed for {symbol}: {e}")),
        };

        let mut patch =
            finish_analyst_patch(ctx, AnalystKind::Social, start, tool_calls_made, false, report).await;
        patch.social_messages = Some(log);
        Ok(patch)
    }
}
