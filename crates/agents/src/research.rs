//! Research debate: a controller schedules bull and bear researchers each
//! round; the research manager either loops back or synthesizes the
//! investment plan and hands off to the risk manager.

use crate::context::AgentContext;
use async_trait::async_trait;
use graph_engine::{Dispatch, Node, NodeContext, RouteDecision, RouterFn};
use llm_client::LlmMessage;
use std::sync::Arc;
use trading_core::{Blackboard, BlackboardPatch, InvestDebateState, NodeError, ResearchDebateState};

pub const RESEARCH_CONTROLLER: &str = "research_controller";
pub const BULL_RESEARCHER: &str = "bull_researcher";
pub const BEAR_RESEARCHER: &str = "bear_researcher";
pub const RESEARCH_MANAGER: &str = "research_manager";

fn analyst_reports_block(board: &Blackboard) -> String {
    format!(
        "Market: {}\nNews: {}\nSocial: {}\nFundamentals: {}",
        board.market_report.as_deref().unwrap_or("(unavailable)"),
        board.news_report.as_deref().unwrap_or("(unavailable)"),
        board.sentiment_report.as_deref().unwrap_or("(unavailable)"),
        board.fundamentals_report.as_deref().unwrap_or("(unavailable)"),
    )
}

/// Increments `current_round` on every entry, guaranteeing termination,
/// then fans out to the two researchers.
pub struct ResearchController;

#[async_trait]
impl Node for ResearchController {
    fn name(&self) -> &str {
        RESEARCH_CONTROLLER
    }

    async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let old = snapshot.research_debate_state.clone().unwrap_or_default();
        let max_rounds = if old.max_rounds == 0 { 3 } else { old.max_rounds };
        let mut patch = BlackboardPatch::default();
        patch.step = Some("research_debate".to_string());
        patch.research_debate_state = Some(ResearchDebateState {
            current_round: old.current_round + 1,
            max_rounds,
            debate_history: old.debate_history,
            consensus_reached: old.consensus_reached,
        });
        Ok(patch)
    }
}

pub fn research_dispatch_router() -> RouterFn {
    Arc::new(|board: &Blackboard| {
        RouteDecision::Sends(vec![
            Dispatch::to(BULL_RESEARCHER, board.clone()),
            Dispatch::to(BEAR_RESEARCHER, board.clone()),
        ])
    })
}

pub struct BullResearcher {
    pub ctx: Arc<AgentContext>,
}

#[async_trait]
impl Node for BullResearcher {
    fn name(&self) -> &str {
        BULL_RESEARCHER
    }

    async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let symbol = &snapshot.company_of_interest;
        let lessons = self.ctx.memory.retrieve(symbol, "bull case");
        let round = snapshot.research_debate_state.as_ref().map(|s| s.current_round).unwrap_or(1);
        let prompt = format!(
            "You are the bull researcher for {symbol}. Round {round}. Make the strongest \
             case for buying, grounded in the analyst reports below.\n\n{}\n\n{}",
            analyst_reports_block(snapshot),
            if lessons.is_empty() { String::new() } else { format!("Prior lessons: {lessons}") },
        );
        let argument = match self.ctx.llm.chat(&[LlmMessage::user(prompt)], &[]).await {
            Ok(r) => r.content.unwrap_or_else(|| "(no bull argument produced)".to_string()),
            Err(e) => format!("(bull researcher LLM call failed: {e})"),
        };

        let old = snapshot.investment_debate_state.clone().unwrap_or_default();
        let bull_history = if old.bull_history.is_empty() {
            argument.clone()
        } else {
            format!("{}\n\nRound {round}: {}", old.bull_history, argument)
        };

        let mut patch = BlackboardPatch::default();
        patch.investment_debate_state = Some(InvestDebateState {
            bull_history,
            current_response: argument,
            count: round,
            ..Default::default()
        });
        Ok(patch)
    }
}

pub struct BearResearcher {
    pub ctx: Arc<AgentContext>,
}

#[async_trait]
impl Node for BearResearcher {
    fn name(&self) -> &str {
        BEAR_RESEARCHER
    }

    async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let symbol = &snapshot.company_of_interest;
        let lessons = self.ctx.memory.retrieve(symbol, "bear case");
        let round = snapshot.research_debate_state.as_ref().map(|s| s.current_round).unwrap_or(1);
        let prompt = format!(
            "You are the bear researcher for {symbol}. Round {round}. Make the strongest \
             case against buying, grounded in the analyst reports below.\n\n{}\n\n{}",
            analyst_reports_block(snapshot),
            if lessons.is_empty() { String::new() } else { format!("Prior lessons: {lessons}") },
        );
        let argument = match self.ctx.llm.chat(&[LlmMessage::user(prompt)], &[]).await {
            Ok(r) => r.content.unwrap_or_else(|| "(no bear argument produced)".to_string()),
            Err(e) => format!("(bear researcher LLM call failed: {e})"),
        };

        let old = snapshot.investment_debate_state.clone().unwrap_or_default();
        let bear_history = if old.bear_history.is_empty() {
            argument.clone()
        } else {
            format!("{}\n\nRound {round}: {}", old.bear_history, argument)
        };

        let mut patch = BlackboardPatch::default();
        patch.investment_debate_state = Some(InvestDebateState {
            bear_history,
            current_response: argument,
            count: round,
            ..Default::default()
        });
        Ok(patch)
    }
}

pub struct ResearchManager {
    pub ctx: Arc<AgentContext>,
}

#[async_trait]
impl Node for ResearchManager {
    fn name(&self) -> &str {
        RESEARCH_MANAGER
    }

    async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let debate = snapshot.investment_debate_state.clone().unwrap_or_default();
        let research = snapshot.research_debate_state.clone().unwrap_or_default();

        let reached_max = research.current_round >= research.max_rounds;

        let mut patch = BlackboardPatch::default();
        if !reached_max {
            patch.continue_debate = Some(true);
            return Ok(patch);
        }

        patch.continue_debate = Some(false);
        let symbol = &snapshot.company_of_interest;
        let prompt = format!(
            "You are the research manager for {symbol}. Synthesize a final investment plan \
             from the bull and bear cases below. Be decisive.\n\nBull case:\n{}\n\nBear case:\n{}",
            debate.bull_history, debate.bear_history,
        );
        let plan = match self.ctx.llm.chat(&[LlmMessage::user(prompt)], &[]).await {
            Ok(r) => r.content.unwrap_or_else(|| {
                format!("No clear consensus emerged for {symbol}; proceed with caution.")
            }),
            Err(e) => format!("Research manager LLM call failed for {symbol}: {e}"),
        };

        patch.investment_debate_state = Some(InvestDebateState {
            judge_decision: plan.clone(),
            ..debate
        });
        patch.investment_plan = Some(plan);
        Ok(patch)
    }
}

/// Loop back to the controller while rounds remain, otherwise proceed to
/// the risk gate.
pub fn research_manager_router(risk_gate_node: &'static str) -> RouterFn {
    Arc::new(move |board: &Blackboard| {
        if board.continue_debate {
            RouteDecision::Next(RESEARCH_CONTROLLER.to_string())
        } else {
            RouteDecision::Next(risk_gate_node.to_string())
        }
    })
}
