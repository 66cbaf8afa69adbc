use serde::Serialize;

/// A single progress event surfaced to the SSE layer.
///
/// `#[serde(tag = "type")]` gives each variant the `{"type": "...", ...}`
/// shape the streaming table names; field names match the table verbatim.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GraphEvent {
    Status {
        message: String,
    },
    AgentStatus {
        agent: String,
        status: AgentStatusValue,
    },
    Report {
        section: String,
        content: String,
    },
    Progress {
        content: u8,
    },
    Reasoning {
        content: String,
    },
    Complete {
        signal: String,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatusValue {
    InProgress,
    Completed,
    Error,
}

impl GraphEvent {
    pub fn status(message: impl Into<String>) -> Self {
        GraphEvent::Status { message: message.into() }
    }

    pub fn agent_status(agent: impl Into<String>, status: AgentStatusValue) -> Self {
        GraphEvent::AgentStatus { agent: agent.into(), status }
    }

    pub fn report(section: impl Into<String>, content: impl Into<String>) -> Self {
        GraphEvent::Report { section: section.into(), content: content.into() }
    }

    pub fn progress(content: u8) -> Self {
        GraphEvent::Progress { content: content.min(100) }
    }

    pub fn complete(signal: impl Into<String>) -> Self {
        GraphEvent::Complete { signal: signal.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        GraphEvent::Error { message: message.into() }
    }
}

/// Sink nodes use to emit progress events. A no-op sink is used for the
/// non-streaming `/analyze` path; the SSE bridge wires a real channel.
pub type EventSink = Option<tokio::sync::mpsc::UnboundedSender<GraphEvent>>;

pub fn emit(sink: &EventSink, event: GraphEvent) {
    if let Some(tx) = sink {
        let _ = tx.send(event);
    }
}
