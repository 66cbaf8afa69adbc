//! The node implementations and graph topology for the trading analysis
//! run: four parallel analysts, an aggregator, a bull/bear research debate,
//! a risky/safe/neutral risk debate, and a trader that terminates the run.

pub mod aggregator;
pub mod analysts;
pub mod context;
pub mod dispatch;
pub mod memory;
pub mod research;
pub mod risk;
pub mod tools;
pub mod trader;

pub use context::{AgentConfig, AgentContext, AnalystMode};
pub use memory::{MemoryStore, NullMemory};

use graph_engine::{GraphEngine, NextEdge};
use std::sync::Arc;

/// Assembles the full graph: intake, the four-way analyst dispatch,
/// aggregation, the research debate loop, the risk debate loop, and the
/// trader.
pub fn build_graph(ctx: Arc<AgentContext>) -> GraphEngine {
    let mut engine = GraphEngine::new("intake");

    engine.add_node(
        Arc::new(dispatch::IntakeNode),
        NextEdge::Conditional(dispatch::analyst_dispatch_router()),
    );
    engine.add_node(
        Arc::new(analysts::market::MarketAnalyst { ctx: ctx.clone() }),
        NextEdge::Direct("aggregator".to_string()),
    );
    engine.add_node(
        Arc::new(analysts::news::NewsAnalyst { ctx: ctx.clone() }),
        NextEdge::Direct("aggregator".to_string()),
    );
    engine.add_node(
        Arc::new(analysts::social::SocialAnalyst { ctx: ctx.clone() }),
        NextEdge::Direct("aggregator".to_string()),
    );
    engine.add_node(
        Arc::new(analysts::fundamentals::FundamentalsAnalyst { ctx: ctx.clone() }),
        NextEdge::Direct("aggregator".to_string()),
    );

    engine.add_node(
        Arc::new(aggregator::Aggregator),
        NextEdge::Direct(research::RESEARCH_CONTROLLER.to_string()),
    );

    engine.add_node(
        research_controller(),
        NextEdge::Conditional(research::research_dispatch_router()),
    );
    engine.add_node(
        Arc::new(research::BullResearcher { ctx: ctx.clone() }),
        NextEdge::Direct(research::RESEARCH_MANAGER.to_string()),
    );
    engine.add_node(
        Arc::new(research::BearResearcher { ctx: ctx.clone() }),
        NextEdge::Direct(research::RESEARCH_MANAGER.to_string()),
    );
    engine.add_node(
        Arc::new(research::ResearchManager { ctx: ctx.clone() }),
        NextEdge::Conditional(research::research_manager_router(risk::RISK_MANAGER)),
    );

    engine.add_node(
        Arc::new(risk::RiskManager { ctx: ctx.clone() }),
        NextEdge::Conditional(risk::risk_manager_router(trader::TRADER)),
    );
    engine.add_node(
        Arc::new(risk::RiskDebateOrchestrator),
        NextEdge::Conditional(risk::risk_dispatch_router()),
    );
    engine.add_node(
        Arc::new(risk::RiskyDebator { ctx: ctx.clone() }),
        NextEdge::Direct(risk::RISK_AGGREGATOR.to_string()),
    );
    engine.add_node(
        Arc::new(risk::SafeDebator { ctx: ctx.clone() }),
        NextEdge::Direct(risk::RISK_AGGREGATOR.to_string()),
    );
    engine.add_node(
        Arc::new(risk::NeutralDebator { ctx: ctx.clone() }),
        NextEdge::Direct(risk::RISK_AGGREGATOR.to_string()),
    );
    engine.add_node(
        Arc::new(risk::RiskAggregator),
        NextEdge::Direct(risk::RISK_MANAGER.to_string()),
    );

    engine.add_node(Arc::new(trader::Trader { ctx }), NextEdge::End);

    engine
}

fn research_controller() -> Arc<research::ResearchController> {
    Arc::new(research::ResearchController)
}
