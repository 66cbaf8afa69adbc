//! The HTTP surface: two operational endpoints (`/analyze`,
//! `/analyze/stream`) and two observability endpoints (`/health`, `/`).
//!
//! Multiprocessing workers that might re-launch this binary are not a
//! concern here: the service runs as a single process with process-wide
//! singletons, so `main.rs` has no worker-guard logic.

mod request_id;
mod security_headers;

use agents::AgentContext;
use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use futures_util::stream::Stream;
use futures_util::StreamExt;
use request_id::request_id_middleware;
use security_headers::security_headers_middleware;
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
struct AppState {
    agents: Arc<AgentContext>,
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let agents = Arc::new(AgentContext::from_env().await);
    let state = AppState { agents };

    let app = Router::new()
        .route("/health", get(health))
        .route("/", get(service_descriptor))
        .route("/analyze", post(analyze))
        .route("/analyze/stream", get(analyze_stream))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port: u16 = std::env::var("API_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "api-server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}

async fn service_descriptor() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "trading-analysis-orchestrator",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": ["/health", "/analyze", "/analyze/stream"],
    }))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    ticker: String,
}

/// POST /analyze: 200 on success *and* on application-level errors
/// reported in the body, 400 on empty `ticker`.
async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> impl IntoResponse {
    let ticker = req.ticker.trim();
    if ticker.is_empty() {
        return (
            axum::http::StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "ticker must not be empty" })),
        )
            .into_response();
    }

    let response = orchestrator::run_analysis(state.agents.clone(), ticker).await;
    (axum::http::StatusCode::OK, Json(response)).into_response()
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    ticker: String,
}

/// GET /analyze/stream: bridges the graph's event channel to an SSE
/// response, one `data:` line per `GraphEvent`.
async fn analyze_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = orchestrator::run_analysis_stream(state.agents.clone(), query.ticker.trim());
    let stream = UnboundedReceiverStream::new(rx).map(|event| {
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().data("event serialization failed")))
    });
    Sse::new(stream).keep_alive(axum::response::sse::KeepAlive::default())
}
