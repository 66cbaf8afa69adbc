use crate::event::EventSink;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use trading_core::{Blackboard, BlackboardPatch, NodeError};

/// Everything a node needs besides its own read-only snapshot: a cancellation
/// token for the per-analyst/per-run timeout and an event sink for SSE
/// progress.
#[derive(Clone)]
pub struct NodeContext {
    pub events: EventSink,
    pub cancellation: CancellationToken,
}

/// A node is a function from a read-only Blackboard snapshot to a partial
/// update. Implementations must not mutate the snapshot; they communicate
/// everything through the returned patch.
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, snapshot: &Blackboard, ctx: &NodeContext) -> Result<BlackboardPatch, NodeError>;
}

/// One message produced by a routing function: run `target` against an
/// independent snapshot. The engine fans these out concurrently and folds
/// every returned patch back into the parent via the field reducers.
pub struct Dispatch {
    pub target: String,
    pub state: Blackboard,
}

impl Dispatch {
    pub fn to(target: impl Into<String>, state: Blackboard) -> Self {
        Self { target: target.into(), state }
    }
}

/// Outcome of a routing function consulted after a node (or a batch of
/// Sends) completes.
pub enum RouteDecision {
    /// Run a single named node next against the current Blackboard.
    Next(String),
    /// Fan out to multiple nodes concurrently, each on its own snapshot.
    Sends(Vec<Dispatch>),
    /// Terminate the run.
    End,
}

pub type RouterFn = Arc<dyn Fn(&Blackboard) -> RouteDecision + Send + Sync>;

/// The static out-edge declared for a node at registration time: an edge
/// set with an optional routing function.
pub enum NextEdge {
    /// Unconditionally proceed to the named node.
    Direct(String),
    /// Consult a routing function against the post-merge Blackboard.
    Conditional(RouterFn),
    /// This node terminates the run.
    End,
}
