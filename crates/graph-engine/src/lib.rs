pub mod engine;
pub mod event;
pub mod node;

pub use engine::GraphEngine;
pub use event::{emit, AgentStatusValue, EventSink, GraphEvent};
pub use node::{Dispatch, NextEdge, Node, NodeContext, RouteDecision, RouterFn};
