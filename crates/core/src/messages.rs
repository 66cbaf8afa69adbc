use serde::{Deserialize, Serialize};

/// Role of a single entry in an analyst's per-run message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    ToolCall,
    ToolResult,
}

/// One entry in an analyst's message log. Tool-call/tool-result entries
/// carry `tool_name`/`tool_call_id` so the log reads as a coherent
/// transcript of the LLM-driven tool loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

impl AgentMessage {
    pub fn user(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::User,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::Assistant,
            content: content.into(),
            tool_name: None,
            tool_call_id: None,
        }
    }

    pub fn tool_call(id: impl Into<String>, tool_name: impl Into<String>, args: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::ToolCall,
            content: args.into(),
            tool_name: Some(tool_name.into()),
            tool_call_id: None,
        }
    }

    pub fn tool_result(id: impl Into<String>, tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: MessageRole::ToolResult,
            content: content.into(),
            tool_name: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}
