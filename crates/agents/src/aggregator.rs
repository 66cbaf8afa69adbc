//! Aggregator: runs once after the four analyst Sends rejoin, converting
//! four independent report outcomes into a single readiness verdict.

use async_trait::async_trait;
use graph_engine::{Node, NodeContext};
use trading_core::{
    AggregationStatus, AnalystKind, Blackboard, BlackboardPatch, InvestDebateState, NodeError,
    ResearchDebateState, RiskDebateState,
};

use crate::tools::is_valid_report;

pub struct Aggregator;

#[async_trait]
impl Node for Aggregator {
    fn name(&self) -> &str {
        "aggregator"
    }

    async fn run(&self, snapshot: &Blackboard, _ctx: &NodeContext) -> Result<BlackboardPatch, NodeError> {
        let mut patch = BlackboardPatch::default();
        patch.step = Some("aggregating".to_string());

        let mut valid = 0usize;
        let mut empty_reports = Vec::new();
        for kind in AnalystKind::ALL {
            match snapshot.report_for(kind) {
                Some(report) if is_valid_report(report) => valid += 1,
                _ => empty_reports.push(kind.as_str().to_string()),
            }
        }

        let status = AggregationStatus::from_valid_count(valid);
        patch.aggregation_status = Some(status);
        patch.successful_analysts_count = Some(valid as u32);
        patch.aggregation_ready = Some(status.is_ready());
        patch.low_quality_reports = Some(valid < 2);
        patch.empty_reports = Some(empty_reports);

        let times: Vec<f64> = snapshot.analyst_execution_times.values().copied().collect();
        let sum_times: f64 = times.iter().sum();
        let max_time = times.iter().cloned().fold(0.0_f64, f64::max);
        patch.parallel_end_time = Some(now_secs());
        if let Some(start) = snapshot.parallel_start_time {
            patch.total_parallel_time = Some((patch.parallel_end_time.unwrap() - start).max(0.0));
        }
        if max_time > 0.0 {
            patch.speedup_factor = Some(sum_times / max_time);
        }

        if snapshot.investment_debate_state.is_none() {
            patch.investment_debate_state = Some(InvestDebateState::default());
        }
        if snapshot.research_debate_state.is_none() {
            patch.research_debate_state = Some(ResearchDebateState { max_rounds: 3, ..Default::default() });
        }
        if snapshot.risk_debate_state.is_none() {
            patch.risk_debate_state = Some(RiskDebateState::default());
        }

        Ok(patch)
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;
    use trading_core::AnalystStatus;

    fn ctx() -> NodeContext {
        NodeContext { events: None, cancellation: CancellationToken::new() }
    }

    #[tokio::test]
    async fn four_valid_reports_yield_success_and_ready() {
        let mut board = Blackboard::new("NVDA", "2026-07-28");
        for kind in AnalystKind::ALL {
            let mut p = BlackboardPatch::default();
            p.set_report(kind, "x".repeat(60));
            p.set_status(kind, AnalystStatus::Completed);
            board.apply(p);
        }
        let patch = Aggregator.run(&board, &ctx()).await.unwrap();
        assert_eq!(patch.aggregation_status, Some(AggregationStatus::Success));
        assert_eq!(patch.successful_analysts_count, Some(4));
        assert_eq!(patch.aggregation_ready, Some(true));
    }

    #[tokio::test]
    async fn zero_valid_reports_yield_complete_failure() {
        let board = Blackboard::new("NVDA", "2026-07-28");
        let patch = Aggregator.run(&board, &ctx()).await.unwrap();
        assert_eq!(patch.aggregation_status, Some(AggregationStatus::CompleteFailure));
        assert_eq!(patch.aggregation_ready, Some(false));
        assert_eq!(patch.low_quality_reports, Some(true));
    }
}
