//! Trader: one-shot synthesis of the investment plan and the risk manager's
//! judgment into the trade decision that terminates the run.

use crate::context::AgentContext;
use crate::risk::extract_processed_signal;
use async_trait::async_trait;
use graph_engine::{Node, NodeContext};
use llm_client::LlmMessage;
use std::sync::Arc;
use trading_core::{Blackboard, BlackboardPatch, NodeError};

pub const TRADER: &str = "trader";

pub struct Trader {
    pub ctx: Arc<AgentContext>,
}

#[async_trait]
impl Node for Trader {
    fn name(&self) -> &str {
        TRADER
    }

    async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let symbol = &snapshot.company_of_interest;
        let plan = snapshot.investment_plan.as_deref().unwrap_or("(no investment plan available)");
        let risk_decision = snapshot
            .risk_debate_state
            .as_ref()
            .map(|s| s.judge_decision.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("(no risk manager judgment available)");

        let prompt = format!(
            "You are the trader for {symbol}. Reconcile the investment plan with the risk \
             manager's judgment into a final trading decision. End your response with the \
             literal phrase \"FINAL DECISION: BUY\", \"FINAL DECISION: SELL\", or \
             \"FINAL DECISION: HOLD\".\n\nInvestment plan:\n{plan}\n\nRisk manager judgment:\n{risk_decision}"
        );

        let decision = match self.ctx.llm.chat(&[LlmMessage::user(prompt)], &[]).await {
            Ok(r) => r.content.unwrap_or_else(|| {
                format!("No trade decision reached for {symbol}. FINAL DECISION: HOLD")
            }),
            Err(e) => format!("Trader LLM call failed for {symbol}: {e}. FINAL DECISION: HOLD"),
        };

        let mut patch = BlackboardPatch::default();
        patch.trader_investment_plan = Some(decision.clone());
        patch.final_trade_decision = Some(decision);
        Ok(patch)
    }
}

/// Derives the API-facing `processed_signal` (BUY/SELL/HOLD) from the
/// trader's final decision text. Lives alongside the trader rather than in
/// `orchestrator` because the extraction rule is a property of the decision
/// text this node produces, not of the HTTP response shape.
pub fn processed_signal(decision: &str) -> String {
    extract_processed_signal(decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processed_signal_reads_trailing_final_decision() {
        assert_eq!(processed_signal("reasoning...\nFINAL DECISION: BUY"), "BUY");
    }
}
