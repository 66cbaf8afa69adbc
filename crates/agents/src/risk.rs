//! Risk debate & risk manager: the risk manager gates between a first entry
//! (kick off the risky/safe/neutral debate) and a second entry (compose the
//! final decision once the debate has substantive history).

use crate::context::AgentContext;
use async_trait::async_trait;
use graph_engine::{Dispatch, Node, NodeContext, RouteDecision, RouterFn};
use llm_client::LlmMessage;
use std::sync::Arc;
use trading_core::{Blackboard, BlackboardPatch, NodeError, RiskDebateState};

pub const RISK_DEBATE_ORCHESTRATOR: &str = "risk_debate_orchestrator";
pub const RISKY_DEBATOR: &str = "risky_debator";
pub const SAFE_DEBATOR: &str = "safe_debator";
pub const NEUTRAL_DEBATOR: &str = "neutral_debator";
pub const RISK_AGGREGATOR: &str = "risk_aggregator";
pub const RISK_MANAGER: &str = "risk_manager";

pub struct RiskDebateOrchestrator;

#[async_trait]
impl Node for RiskDebateOrchestrator {
    fn name(&self) -> &str {
        RISK_DEBATE_ORCHESTRATOR
    }

    async fn run(&self, _snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let mut patch = BlackboardPatch::default();
        patch.step = Some("risk_debate".to_string());
        Ok(patch)
    }
}

pub fn risk_dispatch_router() -> RouterFn {
    Arc::new(|board: &Blackboard| {
        RouteDecision::Sends(vec![
            Dispatch::to(RISKY_DEBATOR, board.clone()),
            Dispatch::to(SAFE_DEBATOR, board.clone()),
            Dispatch::to(NEUTRAL_DEBATOR, board.clone()),
        ])
    })
}

async fn debator_perspective(
    ctx: &AgentContext,
    symbol: &str,
    stance: &str,
    investment_plan: &str,
) -> String {
    let prompt = format!(
        "You are the {stance} risk analyst for {symbol}. React to this investment plan \
         with a {stance}-appropriate risk perspective.\n\nInvestment plan:\n{investment_plan}"
    );
    match ctx.llm.chat(&[LlmMessage::user(prompt)], &[]).await {
        Ok(r) => r.content.unwrap_or_else(|| format!("(no {stance} perspective produced)")),
        Err(e) => format!("({stance} risk analyst LLM call failed: {e})"),
    }
}

macro_rules! risk_debator {
    ($struct_name:ident, $node_name:expr, $stance:expr, $field:ident) => {
        pub struct $struct_name {
            pub ctx: Arc<AgentContext>,
        }

        #[async_trait]
        impl Node for $struct_name {
            fn name(&self) -> &str {
                $node_name
            }

            async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
                let symbol = &snapshot.company_of_interest;
                let plan = snapshot.investment_plan.as_deref().unwrap_or("(no investment plan available)");
                let perspective = debator_perspective(&self.ctx, symbol, $stance, plan).await;

                let mut patch = BlackboardPatch::default();
                patch.risk_debate_state = Some(RiskDebateState {
                    $field: perspective.clone(),
                    latest_speaker: $stance.to_string(),
                    current_risky_response: String::new(),
                    current_safe_response: String::new(),
                    current_neutral_response: String::new(),
                    ..Default::default()
                });
                Ok(patch)
            }
        }
    };
}

risk_debator!(RiskyDebator, RISKY_DEBATOR, "risky", risky_history);
risk_debator!(SafeDebator, SAFE_DEBATOR, "safe", safe_history);
risk_debator!(NeutralDebator, NEUTRAL_DEBATOR, "neutral", neutral_history);

/// Concatenates all non-empty perspectives into `history`.
pub struct RiskAggregator;

#[async_trait]
impl Node for RiskAggregator {
    fn name(&self) -> &str {
        RISK_AGGREGATOR
    }

    async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let state = snapshot.risk_debate_state.clone().unwrap_or_default();
        let perspectives = [
            ("Risky", &state.risky_history),
            ("Safe", &state.safe_history),
            ("Neutral", &state.neutral_history),
        ];
        let history = perspectives
            .iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(label, text)| format!("{label}: {text}"))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut patch = BlackboardPatch::default();
        patch.risk_debate_state = Some(RiskDebateState { history, ..state });
        Ok(patch)
    }
}

/// Risk manager: first entry gates into the debate, second entry composes
/// the final decision once the debate has substantive history.
pub struct RiskManager {
    pub ctx: Arc<AgentContext>,
}

/// Extracts the last whitespace-delimited token after the literal
/// `"FINAL DECISION:"`, uppercased, validated against {BUY, SELL, HOLD};
/// anything else yields `HOLD` with a logged warning.
pub fn extract_processed_signal(decision: &str) -> String {
    if let Some(idx) = decision.find("FINAL DECISION:") {
        let tail = &decision[idx + "FINAL DECISION:".len()..];
        if let Some(token) = tail.split_whitespace().next() {
            let upper = token.trim_matches(|c: char| !c.is_ascii_alphabetic()).to_uppercase();
            if matches!(upper.as_str(), "BUY" | "SELL" | "HOLD") {
                return upper;
            }
        }
    }
    tracing::warn!("could not extract a valid processed_signal from final decision; defaulting to HOLD");
    "HOLD".to_string()
}

#[async_trait]
impl Node for RiskManager {
    fn name(&self) -> &str {
        RISK_MANAGER
    }

    async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let debate = snapshot.risk_debate_state.clone().unwrap_or_default();
        if !debate.has_substantive_history() {
            // First entry: nothing to compose yet, the conditional edge
            // routes to the debate orchestrator.
            return Ok(BlackboardPatch::default());
        }

        let symbol = &snapshot.company_of_interest;
        let lessons = self.ctx.memory.retrieve(symbol, "risk management");
        let plan = snapshot.investment_plan.as_deref().unwrap_or("(no investment plan available)");
        let prompt = format!(
            "You are the risk manager for {symbol}. Compose the final trading decision from \
             the investment plan and the risk debate below. End your response with the literal \
             phrase \"FINAL DECISION: BUY\", \"FINAL DECISION: SELL\", or \"FINAL DECISION: HOLD\".\n\n\
             Investment plan:\n{plan}\n\nRisk debate:\n{}\n\n{}",
            debate.history,
            if lessons.is_empty() { String::new() } else { format!("Prior lessons: {lessons}") },
        );

        let decision = match self.ctx.llm.chat(&[LlmMessage::user(prompt)], &[]).await {
            Ok(r) => r.content.unwrap_or_else(|| format!("No risk decision reached for {symbol}. FINAL DECISION: HOLD")),
            Err(e) => format!("Risk manager LLM call failed for {symbol}: {e}. FINAL DECISION: HOLD"),
        };

        let mut patch = BlackboardPatch::default();
        patch.risk_debate_state = Some(RiskDebateState { judge_decision: decision, ..debate });
        patch.risk_analysis_needed = Some(false);
        Ok(patch)
    }
}

/// First entry (`risk_analysis_needed` still true) routes to the debate
/// orchestrator; second entry, once this node has cleared the flag after
/// composing `judge_decision`, routes to the trader. The trader, not the
/// risk manager, is authoritative for `final_trade_decision`.
pub fn risk_manager_router(trader_node: &'static str) -> RouterFn {
    Arc::new(move |board: &Blackboard| {
        if board.risk_analysis_needed {
            RouteDecision::Next(RISK_DEBATE_ORCHESTRATOR.to_string())
        } else {
            RouteDecision::Next(trader_node.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_valid_signal_tokens() {
        assert_eq!(extract_processed_signal("some analysis\nFINAL DECISION: BUY"), "BUY");
        assert_eq!(extract_processed_signal("blah FINAL DECISION: sell."), "SELL");
    }

    #[test]
    fn defaults_to_hold_when_missing_or_invalid() {
        assert_eq!(extract_processed_signal("no decision here"), "HOLD");
        assert_eq!(extract_processed_signal("FINAL DECISION: MAYBE"), "HOLD");
    }
}
