use serde::{Deserialize, Serialize};

/// Lifecycle state of a single analyst's report within one run.
///
/// Transitions: `Pending` -> `Running` -> one of `Completed`, `Warning`,
/// `Error`, exactly once per run (spec §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalystStatus {
    Pending,
    Running,
    Completed,
    Warning,
    Error,
}

impl Default for AnalystStatus {
    fn default() -> Self {
        AnalystStatus::Pending
    }
}

/// Outcome of the aggregator's pass over the four analyst reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStatus {
    Pending,
    Success,
    PartialSuccess,
    MinimalSuccess,
    CompleteFailure,
}

impl Default for AggregationStatus {
    fn default() -> Self {
        AggregationStatus::Pending
    }
}

impl AggregationStatus {
    /// Derive the status from a count of valid (non-empty, non-error) reports.
    ///
    /// 4 or 3 -> success, 2 -> partial, 1 -> minimal, 0 -> complete failure.
    pub fn from_valid_count(valid: usize) -> Self {
        match valid {
            4 | 3 => AggregationStatus::Success,
            2 => AggregationStatus::PartialSuccess,
            1 => AggregationStatus::MinimalSuccess,
            _ => AggregationStatus::CompleteFailure,
        }
    }

    pub fn is_ready(&self) -> bool {
        !matches!(self, AggregationStatus::CompleteFailure | AggregationStatus::Pending)
    }
}

/// The four analyst kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalystKind {
    Market,
    News,
    Social,
    Fundamentals,
}

impl AnalystKind {
    pub const ALL: [AnalystKind; 4] = [
        AnalystKind::Market,
        AnalystKind::News,
        AnalystKind::Social,
        AnalystKind::Fundamentals,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalystKind::Market => "market",
            AnalystKind::News => "news",
            AnalystKind::Social => "social",
            AnalystKind::Fundamentals => "fundamentals",
        }
    }

    /// Key used for the corresponding report field (social reports live
    /// under `sentiment_report`, a historical naming quirk).
    pub fn report_field(&self) -> &'static str {
        match self {
            AnalystKind::Social => "sentiment_report",
            other => other.as_str(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregation_status_thresholds() {
        assert_eq!(AggregationStatus::from_valid_count(4), AggregationStatus::Success);
        assert_eq!(AggregationStatus::from_valid_count(3), AggregationStatus::Success);
        assert_eq!(AggregationStatus::from_valid_count(2), AggregationStatus::PartialSuccess);
        assert_eq!(AggregationStatus::from_valid_count(1), AggregationStatus::MinimalSuccess);
        assert_eq!(AggregationStatus::from_valid_count(0), AggregationStatus::CompleteFailure);
    }

    #[test]
    fn is_ready_excludes_failure_and_pending() {
        assert!(!AggregationStatus::CompleteFailure.is_ready());
        assert!(!AggregationStatus::Pending.is_ready());
        assert!(AggregationStatus::MinimalSuccess.is_ready());
    }
}
