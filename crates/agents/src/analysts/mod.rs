pub mod fundamentals;
pub mod market;
pub mod news;
pub mod social;

use crate::context::AgentContext;
use crate::tools::is_low_quality;
use graph_engine::{emit, GraphEvent, NodeContext};
use llm_client::{LlmMessage, ToolLoopConfig};
use std::sync::Arc;
use std::time::Instant;
use trading_core::{AgentMessage, AnalysisResult, AnalystKind, BlackboardPatch, SignalStrength};
use uuid::Uuid;

/// Average per-engine scores into one signal/confidence pair, used by
/// direct-mode analysts that combine more than one analysis engine into a
/// single report.
pub fn combine_results(results: &[AnalysisResult]) -> (SignalStrength, f64) {
    if results.is_empty() {
        return (SignalStrength::Neutral, 0.0);
    }
    let avg_score =
        results.iter().map(|r| r.signal.to_score() as f64).sum::<f64>() / results.len() as f64;
    let avg_confidence = results.iter().map(|r| r.confidence).sum::<f64>() / results.len() as f64;
    (SignalStrength::from_score(avg_score.round() as i32), avg_confidence)
}

/// Common bookkeeping every analyst node performs around its domain action:
/// emit in-progress/completed SSE events, stamp `execution_time`, and
/// classify the outcome as completed/warning/error (completed with zero
/// tool calls is a warning, not an error).
pub async fn finish_analyst_patch(
    ctx: &NodeContext,
    kind: AnalystKind,
    start: Instant,
    tool_calls: u32,
    warn_on_zero_tool_calls: bool,
    outcome: Result<String, String>,
) -> BlackboardPatch {
    let mut patch = BlackboardPatch::default();
    patch.set_tool_calls(kind, tool_calls);
    patch.set_execution_time(kind, start.elapsed().as_secs_f64());

    match outcome {
        Ok(report) => {
            patch.set_report(kind, report.clone());
            let status = if (warn_on_zero_tool_calls && tool_calls == 0) || is_low_quality(&report) {
                trading_core::AnalystStatus::Warning
            } else {
                trading_core::AnalystStatus::Completed
            };
            patch.set_status(kind, status);
            // AgentStatusValue has no `warning` variant; a warning still
            // surfaces as "completed" on the SSE stream.
            emit(&ctx.events, GraphEvent::agent_status(kind.as_str(), graph_engine::AgentStatusValue::Completed));
            emit(&ctx.events, GraphEvent::report(kind.report_field(), report));
        }
        Err(message) => {
            patch.set_status(kind, trading_core::AnalystStatus::Error);
            patch.set_error(kind, message);
            emit(&ctx.events, GraphEvent::agent_status(kind.as_str(), graph_engine::AgentStatusValue::Error));
        }
    }
    patch
}

pub fn mark_running(ctx: &NodeContext, kind: AnalystKind) {
    emit(&ctx.events, GraphEvent::agent_status(kind.as_str(), graph_engine::AgentStatusValue::InProgress));
}

/// Drives the LLM-driven analyst path: bind the kind's tool allow-list,
/// demand tool use, run the tool loop, and fall back to a warning report if
/// the model never calls a tool.
pub async fn run_llm_driven_analyst(
    ctx_agents: &Arc<AgentContext>,
    kind: AnalystKind,
    symbol: &str,
    trade_date: &str,
) -> (String, u32, Vec<AgentMessage>) {
    let tools = crate::tools::ToolRegistry::tools_for(kind);
    let prompt = format!(
        "You are the {} analyst. Analyze {symbol} as of {trade_date}. \
         You must call at least one tool before answering. Use the available \
         tools to gather data, then produce a structured report with your \
         findings and a clear directional view.",
        kind.as_str()
    );
    let transcript = vec![LlmMessage::user(prompt.clone())];
    let config = ToolLoopConfig {
        max_iterations: ctx_agents.config.max_tool_iterations,
        per_call_timeout: ctx_agents.config.tool_timeout,
    };

    let outcome = llm_client::run_tool_loop(
        ctx_agents.llm.as_ref(),
        &tools,
        ctx_agents.tools.as_ref(),
        transcript,
        config,
    )
    .await;

    let mut log = vec![AgentMessage::user(Uuid::new_v4().to_string(), prompt)];
    match outcome {
        Ok(result) if result.tool_calls_made > 0 && !result.final_content.is_empty() => {
            log.push(AgentMessage::assistant(Uuid::new_v4().to_string(), result.final_content.clone()));
            (result.final_content, result.tool_calls_made, log)
        }
        Ok(result) => {
            let warning = format!(
                "{} analyst produced no usable report for {symbol}: the model made {} tool call(s) \
                 and returned no final content. Treat this report as unavailable.",
                kind.as_str(),
                result.tool_calls_made,
            );
            (warning, result.tool_calls_made, log)
        }
        Err(e) => {
            let warning = format!("{} analyst LLM call failed for {symbol}: {e}", kind.as_str());
            (warning, 0, log)
        }
    }
}
