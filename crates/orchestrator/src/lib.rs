//! Wires the `agents` node set into a runnable graph and exposes the two
//! shapes `api-server` needs: a one-shot `/analyze` call and an
//! event-streaming `/analyze/stream` call.

use agents::{build_graph, AgentContext};
use graph_engine::{emit, GraphEvent, NodeContext};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;
use trading_core::{Blackboard, NodeError};

/// The `/analyze` response body.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub ticker: String,
    pub analysis_date: String,
    pub market_report: String,
    pub sentiment_report: String,
    pub news_report: String,
    pub fundamentals_report: String,
    pub final_trade_decision: String,
    pub processed_signal: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    fn from_board(ticker: &str, trade_date: &str, board: &Blackboard) -> Self {
        let decision = board.final_trade_decision.clone().unwrap_or_default();
        let processed_signal = agents::trader::processed_signal(&decision);
        Self {
            ticker: ticker.to_string(),
            analysis_date: trade_date.to_string(),
            market_report: board.market_report.clone().unwrap_or_default(),
            sentiment_report: board.sentiment_report.clone().unwrap_or_default(),
            news_report: board.news_report.clone().unwrap_or_default(),
            fundamentals_report: board.fundamentals_report.clone().unwrap_or_default(),
            final_trade_decision: decision,
            processed_signal,
            error: None,
        }
    }

    fn failed(ticker: &str, trade_date: &str, message: String) -> Self {
        Self {
            ticker: ticker.to_string(),
            analysis_date: trade_date.to_string(),
            market_report: String::new(),
            sentiment_report: String::new(),
            news_report: String::new(),
            fundamentals_report: String::new(),
            final_trade_decision: String::new(),
            processed_signal: "HOLD".to_string(),
            error: Some(message),
        }
    }
}

fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Runs the graph to completion with no event sink and returns the final
/// response body. Node failures never abort the run; they're recorded in
/// `analyst_errors` and the graph continues. Only a graph-engine error (the
/// execution cap, or a cancellation) surfaces as `Err` here.
pub async fn run_analysis(ctx: Arc<AgentContext>, ticker: &str) -> AnalysisResponse {
    let trade_date = today();
    let graph = build_graph(ctx);
    let initial = Blackboard::new(ticker, trade_date.clone());
    let node_ctx = NodeContext { events: None, cancellation: CancellationToken::new() };

    match graph.run(initial, node_ctx).await {
        Ok(board) => AnalysisResponse::from_board(ticker, &trade_date, &board),
        Err(e) => AnalysisResponse::failed(ticker, &trade_date, format_node_error(&e)),
    }
}

/// Streaming variant: spawns the run on a background task wired to an event
/// channel and returns the receiver immediately. The task emits a `status`
/// event at start, a `complete` event carrying the processed signal on
/// success, or an `error` event on failure, and closes the channel by
/// dropping the sender.
pub fn run_analysis_stream(
    ctx: Arc<AgentContext>,
    ticker: &str,
) -> UnboundedReceiver<GraphEvent> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let ticker = ticker.to_string();
    let trade_date = today();
    let cancellation = CancellationToken::new();

    tokio::spawn(async move {
        let sink = Some(tx);
        emit(&sink, GraphEvent::status(format!("starting analysis for {ticker}")));

        let graph = build_graph(ctx);
        let initial = Blackboard::new(ticker.clone(), trade_date.clone());
        let node_ctx = NodeContext { events: sink.clone(), cancellation };

        match graph.run(initial, node_ctx).await {
            Ok(board) => {
                let response = AnalysisResponse::from_board(&ticker, &trade_date, &board);
                emit(&sink, GraphEvent::complete(response.processed_signal));
            }
            Err(e) => {
                emit(&sink, GraphEvent::error(format_node_error(&e)));
            }
        }
    });

    rx
}

fn format_node_error(e: &NodeError) -> String {
    format!("analysis run failed: {e}")
}
