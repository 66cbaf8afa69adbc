use crate::client::{LlmClient, LlmError, LlmMessage, LlmRole, ToolCallRequest, ToolSpec};
use async_trait::async_trait;
use std::time::Duration;

/// Result of one tool invocation, always Ok from the loop's perspective:
/// executor failures become graceful fallback text, never a propagated
/// error.
pub struct ToolOutcome {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn ok(content: impl Into<String>) -> Self {
        Self { content: content.into(), is_error: false }
    }

    pub fn unavailable(tool_name: &str) -> Self {
        Self {
            content: format!("Tool '{}' is currently unavailable; continue without it.", tool_name),
            is_error: true,
        }
    }
}

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    async fn execute(&self, name: &str, arguments: &serde_json::Value) -> ToolOutcome;
}

#[derive(Debug, Clone)]
pub struct ToolLoopConfig {
    pub max_iterations: u32,
    pub per_call_timeout: Duration,
}

impl Default for ToolLoopConfig {
    fn default() -> Self {
        Self { max_iterations: 6, per_call_timeout: Duration::from_secs(15) }
    }
}

pub struct ToolLoopOutcome {
    pub final_content: String,
    pub transcript: Vec<LlmMessage>,
    pub tool_calls_made: u32,
}

async fn dispatch_tool_call(
    executor: &dyn ToolExecutor,
    call: &ToolCallRequest,
    timeout: Duration,
) -> ToolOutcome {
    match tokio::time::timeout(timeout, executor.execute(&call.name, &call.arguments)).await {
        Ok(outcome) => outcome,
        Err(_) => ToolOutcome::unavailable(&call.name),
    }
}

/// Drives the BeforeLlmCall → CallLlm → AfterLlm → ProcessingToolCalls loop
/// until the model stops requesting tools or `max_iterations` is exhausted.
/// Collapsed to the single-session case this system needs: no streaming, no
/// cache-breakpoint batching, no dynamic tool-set hashing.
///
/// On exhaustion the loop returns whatever content the last call produced;
/// callers treat an empty result as an LLM-driven analyst's warning case.
pub async fn run_tool_loop(
    client: &dyn LlmClient,
    tools: &[ToolSpec],
    executor: &dyn ToolExecutor,
    mut transcript: Vec<LlmMessage>,
    config: ToolLoopConfig,
) -> Result<ToolLoopOutcome, LlmError> {
    let mut tool_calls_made = 0u32;

    for _ in 0..config.max_iterations {
        let response = client.chat(&transcript, tools).await?;

        if response.tool_calls.is_empty() {
            let content = response.content.unwrap_or_default();
            transcript.push(LlmMessage::assistant(content.clone()));
            return Ok(ToolLoopOutcome { final_content: content, transcript, tool_calls_made });
        }

        transcript.push(LlmMessage {
            role: LlmRole::Assistant,
            content: response.content.clone().unwrap_or_default(),
            tool_calls: response.tool_calls.clone(),
            tool_call_id: None,
        });

        let outcomes = futures_util::future::join_all(
            response
                .tool_calls
                .iter()
                .map(|call| dispatch_tool_call(executor, call, config.per_call_timeout)),
        )
        .await;

        for (call, outcome) in response.tool_calls.iter().zip(outcomes) {
            tool_calls_made += 1;
            transcript.push(LlmMessage::tool_result(call.id.clone(), outcome.content));
        }
    }

    Ok(ToolLoopOutcome { final_content: String::new(), transcript, tool_calls_made })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{LlmResponse, ToolCallRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct OneShotTool;

    #[async_trait]
    impl ToolExecutor for OneShotTool {
        async fn execute(&self, name: &str, _arguments: &serde_json::Value) -> ToolOutcome {
            ToolOutcome::ok(format!("result from {}", name))
        }
    }

    struct ScriptedClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn chat(&self, _messages: &[LlmMessage], _tools: &[ToolSpec]) -> Result<LlmResponse, LlmError> {
            let call_index = self.calls.fetch_add(1, Ordering::SeqCst);
            if call_index == 0 {
                Ok(LlmResponse {
                    content: None,
                    tool_calls: vec![ToolCallRequest {
                        id: "call_1".into(),
                        name: "get_price".into(),
                        arguments: serde_json::json!({}),
                    }],
                })
            } else {
                Ok(LlmResponse { content: Some("FINAL DECISION: BUY".into()), tool_calls: vec![] })
            }
        }
    }

    #[tokio::test]
    async fn loop_terminates_once_llm_stops_requesting_tools() {
        let client = ScriptedClient { calls: AtomicUsize::new(0) };
        let executor = OneShotTool;
        let outcome = run_tool_loop(
            &client,
            &[],
            &executor,
            vec![LlmMessage::user("analyze NVDA")],
            ToolLoopConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.final_content, "FINAL DECISION: BUY");
        assert_eq!(outcome.tool_calls_made, 1);
    }

    #[tokio::test]
    async fn loop_caps_at_max_iterations_when_tools_never_stop() {
        struct AlwaysWantsTools;
        #[async_trait]
        impl LlmClient for AlwaysWantsTools {
            async fn chat(&self, _messages: &[LlmMessage], _tools: &[ToolSpec]) -> Result<LlmResponse, LlmError> {
                Ok(LlmResponse {
                    content: None,
                    tool_calls: vec![ToolCallRequest {
                        id: "x".into(),
                        name: "get_price".into(),
                        arguments: serde_json::json!({}),
                    }],
                })
            }
        }

        let executor = Arc::new(OneShotTool);
        let config = ToolLoopConfig { max_iterations: 2, ..Default::default() };
        let outcome = run_tool_loop(
            &AlwaysWantsTools,
            &[],
            executor.as_ref(),
            vec![LlmMessage::user("analyze NVDA")],
            config,
        )
        .await
        .unwrap();

        assert_eq!(outcome.final_content, "");
        assert_eq!(outcome.tool_calls_made, 2);
    }
}
