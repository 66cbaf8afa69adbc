use crate::client::{LlmClient, LlmError, LlmMessage, LlmResponse, LlmRole, ToolCallRequest, ToolSpec};
use crate::config::LlmConfig;
use async_trait::async_trait;
use serde_json::json;

/// LLM client against any OpenAI-compatible `/chat/completions` endpoint.
/// Shares a single pooled `reqwest::Client` across every call: one pool,
/// many typed callers.
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    config: LlmConfig,
}

impl OpenAiCompatibleClient {
    pub fn new(config: LlmConfig) -> Self {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(20)
            .timeout(config.timeout)
            .build()
            .expect("failed to build llm-client reqwest client");
        Self { http, config }
    }
}

fn role_str(role: LlmRole) -> &'static str {
    match role {
        LlmRole::System => "system",
        LlmRole::User => "user",
        LlmRole::Assistant => "assistant",
        LlmRole::Tool => "tool",
    }
}

fn to_wire_message(message: &LlmMessage) -> serde_json::Value {
    let mut value = json!({
        "role": role_str(message.role),
        "content": message.content,
    });
    if let Some(tool_call_id) = &message.tool_call_id {
        value["tool_call_id"] = json!(tool_call_id);
    }
    if !message.tool_calls.is_empty() {
        value["tool_calls"] = json!(message
            .tool_calls
            .iter()
            .map(|call| json!({
                "id": call.id,
                "type": "function",
                "function": { "name": call.name, "arguments": call.arguments.to_string() },
            }))
            .collect::<Vec<_>>());
    }
    value
}

fn to_wire_tool(tool: &ToolSpec) -> serde_json::Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.parameters,
        },
    })
}

fn parse_response(payload: serde_json::Value) -> Result<LlmResponse, LlmError> {
    let message = payload
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .ok_or_else(|| LlmError::Malformed("missing choices[0].message".to_string()))?;

    let content = message.get("content").and_then(|c| c.as_str()).map(str::to_string);

    let tool_calls = message
        .get("tool_calls")
        .and_then(|v| v.as_array())
        .map(|calls| {
            calls
                .iter()
                .filter_map(|call| {
                    let id = call.get("id")?.as_str()?.to_string();
                    let function = call.get("function")?;
                    let name = function.get("name")?.as_str()?.to_string();
                    let raw_args = function.get("arguments")?.as_str().unwrap_or("{}");
                    let arguments = serde_json::from_str(raw_args).unwrap_or(json!({}));
                    Some(ToolCallRequest { id, name, arguments })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(LlmResponse { content, tool_calls })
}

#[async_trait]
impl LlmClient for OpenAiCompatibleClient {
    async fn chat(&self, messages: &[LlmMessage], tools: &[ToolSpec]) -> Result<LlmResponse, LlmError> {
        let mut body = json!({
            "model": self.config.model,
            "messages": messages.iter().map(to_wire_message).collect::<Vec<_>>(),
        });
        if !tools.is_empty() {
            body["tools"] = json!(tools.iter().map(to_wire_tool).collect::<Vec<_>>());
        }

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status { status, body });
        }

        let payload: serde_json::Value = response.json().await?;
        parse_response(payload)
    }
}
