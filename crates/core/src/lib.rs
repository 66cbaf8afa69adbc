pub mod blackboard;
pub mod debate;
pub mod error;
pub mod messages;
pub mod reducers;
pub mod status;
pub mod traits;
pub mod types;

pub use blackboard::{Blackboard, BlackboardPatch, PerformanceSummary};
pub use debate::{InvestDebateState, ResearchDebateState, RiskDebateState};
pub use error::*;
pub use messages::{AgentMessage, MessageRole};
pub use status::{AggregationStatus, AnalystKind, AnalystStatus};
pub use traits::*;
pub use types::*;
