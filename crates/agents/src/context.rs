//! Shared dependencies every node in the graph reads from: collectors, the
//! LLM client, tunables.

use crate::memory::{MemoryStore, NullMemory};
use crate::tools::AgentToolExecutor;
use llm_client::{LlmClient, LlmConfig, OpenAiCompatibleClient};
use market_data::{Cache, FundamentalsCollector, PolygonClient, TechnicalCollector};
use std::sync::Arc;
use std::time::Duration;

/// Whether an analyst computes its report directly from a collector or
/// drives an LLM tool-call loop. Social always runs its own
/// forced-tools-then-synthesize path regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalystMode {
    Direct,
    Llm,
}

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub market_mode: AnalystMode,
    pub fundamentals_mode: AnalystMode,
    pub news_mode: AnalystMode,
    pub tool_timeout: Duration,
    pub max_tool_iterations: u32,
    pub max_research_rounds: u32,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        let mode_of = |key: &str| -> AnalystMode {
            match std::env::var(key).ok().as_deref() {
                Some("llm") => AnalystMode::Llm,
                _ => AnalystMode::Direct,
            }
        };
        Self {
            market_mode: mode_of("MARKET_ANALYST_MODE"),
            fundamentals_mode: mode_of("FUNDAMENTALS_ANALYST_MODE"),
            news_mode: mode_of("NEWS_ANALYST_MODE"),
            tool_timeout: Duration::from_secs(15),
            max_tool_iterations: 6,
            max_research_rounds: std::env::var("MAX_RESEARCH_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

pub struct AgentContext {
    pub polygon: Arc<PolygonClient>,
    pub fundamentals: Arc<FundamentalsCollector>,
    pub technical: Arc<TechnicalCollector>,
    pub llm: Arc<dyn LlmClient>,
    pub tools: Arc<AgentToolExecutor>,
    pub memory: Arc<dyn MemoryStore>,
    pub config: AgentConfig,
}

impl AgentContext {
    pub async fn from_env() -> Self {
        let api_key = std::env::var("FINNHUB_API_KEY")
            .or_else(|_| std::env::var("POLYGON_API_KEY"))
            .unwrap_or_default();
        let polygon = Arc::new(PolygonClient::new(api_key));
        let cache = Cache::from_env().await;
        let fundamentals = Arc::new(FundamentalsCollector::new(polygon.clone(), cache.clone()));
        let technical = Arc::new(TechnicalCollector::new(polygon.clone(), cache));
        let llm = Arc::new(OpenAiCompatibleClient::new(LlmConfig::from_env()));
        let tools = Arc::new(AgentToolExecutor {
            client: polygon.clone(),
            fundamentals: fundamentals.clone(),
            technical: technical.clone(),
        });

        Self {
            polygon,
            fundamentals,
            technical,
            llm,
            tools,
            memory: Arc::new(NullMemory),
            config: AgentConfig::from_env(),
        }
    }
}
