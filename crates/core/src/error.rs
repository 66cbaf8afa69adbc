use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Errors surfaced at node boundaries: node failures are caught and
/// recorded in `analyst_errors`, never propagated through the engine.
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("tool '{tool}' timed out after {timeout_secs}s")]
    ToolTimeout { tool: String, timeout_secs: u64 },

    #[error("LLM call failed: {0}")]
    Llm(String),

    #[error("{0}")]
    Other(String),
}

