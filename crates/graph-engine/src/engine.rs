use crate::node::{Dispatch, NextEdge, Node, NodeContext, RouteDecision};
use std::collections::HashMap;
use std::sync::Arc;
use trading_core::{Blackboard, NodeError};

/// The static graph: node name → node function, plus the declared out-edge
/// for each node. Dispatches nodes whose turn has come, fans out `Send`
/// batches concurrently, reduces their patches back into the shared
/// Blackboard, and resolves conditional edges by consulting the edge's
/// router against the freshly-merged state.
pub struct GraphEngine {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, NextEdge>,
    entry: String,
    max_executions: usize,
}

const DEFAULT_MAX_EXECUTIONS: usize = 200;

impl GraphEngine {
    pub fn new(entry: impl Into<String>) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry: entry.into(),
            max_executions: DEFAULT_MAX_EXECUTIONS,
        }
    }

    pub fn with_max_executions(mut self, max_executions: usize) -> Self {
        self.max_executions = max_executions;
        self
    }

    pub fn add_node(&mut self, node: Arc<dyn Node>, edge: NextEdge) {
        let name = node.name().to_string();
        self.nodes.insert(name.clone(), node);
        self.edges.insert(name, edge);
    }

    /// Run the graph to completion from `initial`, returning the final
    /// Blackboard. Node functions are expected to be concurrency-safe; they
    /// never mutate their snapshot, only return an update.
    pub async fn run(&self, initial: Blackboard, ctx: NodeContext) -> Result<Blackboard, NodeError> {
        let mut board = initial;
        let mut frontier = vec![Dispatch::to(self.entry.clone(), board.clone())];
        let mut executions: usize = 0;

        while !frontier.is_empty() {
            if executions + frontier.len() > self.max_executions {
                return Err(NodeError::Other(format!(
                    "graph execution cap ({}) exceeded",
                    self.max_executions
                )));
            }

            let run_futures = frontier.iter().map(|send| {
                let node = self
                    .nodes
                    .get(&send.target)
                    .unwrap_or_else(|| panic!("graph-engine: unknown node '{}'", send.target))
                    .clone();
                let snapshot = send.state.clone();
                let ctx = ctx.clone();
                let name = send.target.clone();
                async move { (name, node.run(&snapshot, &ctx).await) }
            });

            let results = futures_util::future::join_all(run_futures).await;
            let batch_names: Vec<String> = results.iter().map(|(name, _)| name.clone()).collect();

            for (_, outcome) in results {
                executions += 1;
                board.apply(outcome?);
            }

            frontier = self.next_frontier(&batch_names, &board);
        }

        Ok(board)
    }

    fn next_frontier(&self, batch_names: &[String], board: &Blackboard) -> Vec<Dispatch> {
        match batch_names {
            [] => Vec::new(),
            [single] => match self.edges.get(single) {
                Some(NextEdge::Direct(next)) => vec![Dispatch::to(next.clone(), board.clone())],
                Some(NextEdge::Conditional(router)) => match router(board) {
                    RouteDecision::Next(next) => vec![Dispatch::to(next, board.clone())],
                    RouteDecision::Sends(sends) => sends,
                    RouteDecision::End => Vec::new(),
                },
                Some(NextEdge::End) | None => Vec::new(),
            },
            batch => {
                // A rejoining fan-out: every branch must declare the same
                // direct join target (the engine doesn't support diverging
                // conditional edges mid-batch).
                let next = batch.iter().find_map(|name| match self.edges.get(name) {
                    Some(NextEdge::Direct(next)) => Some(next.clone()),
                    _ => None,
                });
                match next {
                    Some(next) => vec![Dispatch::to(next, board.clone())],
                    None => Vec::new(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use trading_core::{AnalystKind, BlackboardPatch};

    struct Echo(&'static str);

    #[async_trait]
    impl Node for Echo {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(&self, _snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
            let mut patch = BlackboardPatch::default();
            patch.set_report(AnalystKind::Market, format!("ran {}", self.0));
            Ok(patch)
        }
    }

    fn ctx() -> NodeContext {
        NodeContext {
            events: None,
            cancellation: tokio_util::sync::CancellationToken::new(),
        }
    }

    #[tokio::test]
    async fn linear_graph_runs_to_completion() {
        let mut engine = GraphEngine::new("a");
        engine.add_node(Arc::new(Echo("a")), NextEdge::Direct("b".into()));
        engine.add_node(Arc::new(Echo("b")), NextEdge::End);

        let result = engine.run(Blackboard::new("NVDA", "2026-07-28"), ctx()).await.unwrap();
        assert_eq!(result.market_report.as_deref(), Some("ran b"));
    }

    #[tokio::test]
    async fn fan_out_rejoins_at_shared_target() {
        let mut engine = GraphEngine::new("dispatch");
        let router: crate::node::RouterFn = Arc::new(|board| {
            RouteDecision::Sends(vec![
                Dispatch::to("left", board.clone()),
                Dispatch::to("right", board.clone()),
            ])
        });
        engine.add_node(Arc::new(Echo("dispatch")), NextEdge::Conditional(router));
        engine.add_node(Arc::new(Echo("left")), NextEdge::Direct("join".into()));
        engine.add_node(Arc::new(Echo("right")), NextEdge::Direct("join".into()));
        engine.add_node(Arc::new(Echo("join")), NextEdge::End);

        let result = engine.run(Blackboard::new("NVDA", "2026-07-28"), ctx()).await.unwrap();
        assert_eq!(result.market_report.as_deref(), Some("ran join"));
    }

    #[tokio::test]
    async fn execution_cap_is_enforced() {
        let mut engine = GraphEngine::new("loop").with_max_executions(3);
        let router: crate::node::RouterFn = Arc::new(|_board| RouteDecision::Next("loop".to_string()));
        engine.add_node(Arc::new(Echo("loop")), NextEdge::Conditional(router));

        let err = engine.run(Blackboard::new("NVDA", "2026-07-28"), ctx()).await.unwrap_err();
        assert!(matches!(err, NodeError::Other(_)));
    }
}
