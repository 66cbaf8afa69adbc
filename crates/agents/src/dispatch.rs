//! Entry dispatcher: a trivial intake node whose conditional out-edge fans
//! out to the four analyst nodes concurrently via `Dispatch` (graph-engine's
//! `Send` equivalent).

use async_trait::async_trait;
use graph_engine::{Dispatch, Node, NodeContext, RouteDecision, RouterFn};
use std::sync::Arc;
use trading_core::{Blackboard, BlackboardPatch, NodeError};

pub const MARKET_ANALYST: &str = "market_analyst";
pub const NEWS_ANALYST: &str = "news_analyst";
pub const SOCIAL_ANALYST: &str = "social_analyst";
pub const FUNDAMENTALS_ANALYST: &str = "fundamentals_analyst";

pub struct IntakeNode;

#[async_trait]
impl Node for IntakeNode {
    fn name(&self) -> &str {
        "intake"
    }

    async fn run(&self, _snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let mut patch = BlackboardPatch::default();
        patch.step = Some("dispatching".to_string());
        patch.parallel_start_time = Some(
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
        );
        Ok(patch)
    }
}

/// Fans out to all four analysts on independent snapshots of the
/// post-intake Blackboard.
pub fn analyst_dispatch_router() -> RouterFn {
    Arc::new(|board: &Blackboard| {
        RouteDecision::Sends(vec![
            Dispatch::to(MARKET_ANALYST, board.clone()),
            Dispatch::to(NEWS_ANALYST, board.clone()),
            Dispatch::to(SOCIAL_ANALYST, board.clone()),
            Dispatch::to(FUNDAMENTALS_ANALYST, board.clone()),
        ])
    })
}
