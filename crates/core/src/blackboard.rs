//! The shared run state.
//!
//! A `Blackboard` is created when a run starts with identity fields set by
//! the caller and all other fields at zero value. It is owned exclusively by
//! the run's graph engine instance; nodes receive read-only snapshots
//! (`Blackboard::clone`, cheap — no field holds unbounded data) and return a
//! `BlackboardPatch`, which the engine folds in via [`Blackboard::apply`].
//! There is no persistence: the value is dropped when the run ends.

use crate::debate::{InvestDebateState, ResearchDebateState, RiskDebateState};
use crate::messages::AgentMessage;
use crate::reducers::{append_messages, merge_map};
use crate::status::{AggregationStatus, AnalystKind, AnalystStatus};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct Blackboard {
    // ---- identity ----
    pub company_of_interest: String,
    pub trade_date: String,
    pub step: Option<String>,

    // ---- per-analyst reports (last-writer-wins; exclusive per analyst) ----
    pub market_report: Option<String>,
    pub news_report: Option<String>,
    pub sentiment_report: Option<String>,
    pub fundamentals_report: Option<String>,

    // ---- per-analyst status ----
    pub market_analyst_status: AnalystStatus,
    pub news_analyst_status: AnalystStatus,
    pub social_analyst_status: AnalystStatus,
    pub fundamentals_analyst_status: AnalystStatus,

    // ---- per-analyst message logs ----
    pub market_messages: Vec<AgentMessage>,
    pub news_messages: Vec<AgentMessage>,
    pub social_messages: Vec<AgentMessage>,
    pub fundamentals_messages: Vec<AgentMessage>,

    // ---- per-analyst tool-call counts ----
    pub market_tool_calls: u32,
    pub news_tool_calls: u32,
    pub social_tool_calls: u32,
    pub fundamentals_tool_calls: u32,

    // ---- timing ----
    pub analyst_execution_times: HashMap<String, f64>,
    pub parallel_start_time: Option<f64>,
    pub parallel_end_time: Option<f64>,
    pub total_parallel_time: Option<f64>,
    pub speedup_factor: Option<f64>,

    // ---- errors ----
    pub analyst_errors: HashMap<String, String>,
    pub failed_analysts: Vec<String>,

    // ---- aggregation ----
    pub aggregation_status: AggregationStatus,
    pub successful_analysts_count: u32,
    pub aggregation_ready: bool,
    pub low_quality_reports: bool,
    pub empty_reports: Vec<String>,

    // ---- debate states ----
    pub investment_debate_state: Option<InvestDebateState>,
    pub research_debate_state: Option<ResearchDebateState>,
    pub risk_debate_state: Option<RiskDebateState>,

    // ---- plans & decision ----
    pub investment_plan: Option<String>,
    pub trader_investment_plan: Option<String>,
    pub final_trade_decision: Option<String>,

    // ---- control flags ----
    pub continue_debate: bool,
    pub risk_analysis_needed: bool,
}

impl Blackboard {
    /// A fresh Blackboard for a new run: identity fields set, everything
    /// else at zero value.
    pub fn new(company_of_interest: impl Into<String>, trade_date: impl Into<String>) -> Self {
        Self {
            company_of_interest: company_of_interest.into(),
            trade_date: trade_date.into(),
            risk_analysis_needed: true,
            ..Default::default()
        }
    }

    pub fn report_for(&self, kind: AnalystKind) -> Option<&str> {
        match kind {
            AnalystKind::Market => self.market_report.as_deref(),
            AnalystKind::News => self.news_report.as_deref(),
            AnalystKind::Social => self.sentiment_report.as_deref(),
            AnalystKind::Fundamentals => self.fundamentals_report.as_deref(),
        }
    }

    pub fn status_for(&self, kind: AnalystKind) -> AnalystStatus {
        match kind {
            AnalystKind::Market => self.market_analyst_status,
            AnalystKind::News => self.news_analyst_status,
            AnalystKind::Social => self.social_analyst_status,
            AnalystKind::Fundamentals => self.fundamentals_analyst_status,
        }
    }

    /// Apply a node's partial update using each field's reducer: the
    /// engine applies reducer(old, new) per key.
    pub fn apply(&mut self, patch: BlackboardPatch) {
        if let Some(v) = patch.step {
            self.step = Some(v);
        }

        macro_rules! replace_report {
            ($field:ident) => {
                if let Some(v) = patch.$field {
                    self.$field = Some(v);
                }
            };
        }
        replace_report!(market_report);
        replace_report!(news_report);
        replace_report!(sentiment_report);
        replace_report!(fundamentals_report);

        macro_rules! replace_status {
            ($field:ident) => {
                if let Some(v) = patch.$field {
                    self.$field = v;
                }
            };
        }
        replace_status!(market_analyst_status);
        replace_status!(news_analyst_status);
        replace_status!(social_analyst_status);
        replace_status!(fundamentals_analyst_status);

        macro_rules! append_log {
            ($field:ident) => {
                if let Some(v) = patch.$field {
                    self.$field = append_messages(std::mem::take(&mut self.$field), v);
                }
            };
        }
        append_log!(market_messages);
        append_log!(news_messages);
        append_log!(social_messages);
        append_log!(fundamentals_messages);

        macro_rules! replace_count {
            ($field:ident) => {
                if let Some(v) = patch.$field {
                    self.$field = v;
                }
            };
        }
        replace_count!(market_tool_calls);
        replace_count!(news_tool_calls);
        replace_count!(social_tool_calls);
        replace_count!(fundamentals_tool_calls);

        if let Some(v) = patch.analyst_execution_times {
            self.analyst_execution_times =
                merge_map(Some(std::mem::take(&mut self.analyst_execution_times)), Some(v))
                    .unwrap_or_default();
        }
        if let Some(v) = patch.parallel_start_time {
            self.parallel_start_time = Some(v);
        }
        if let Some(v) = patch.parallel_end_time {
            self.parallel_end_time = Some(v);
        }
        if let Some(v) = patch.total_parallel_time {
            self.total_parallel_time = Some(v);
        }
        if let Some(v) = patch.speedup_factor {
            self.speedup_factor = Some(v);
        }

        if let Some(v) = patch.analyst_errors {
            self.analyst_errors =
                merge_map(Some(std::mem::take(&mut self.analyst_errors)), Some(v)).unwrap_or_default();
        }
        if let Some(v) = patch.failed_analysts {
            self.failed_analysts = v;
        }

        if let Some(v) = patch.aggregation_status {
            self.aggregation_status = v;
        }
        if let Some(v) = patch.successful_analysts_count {
            self.successful_analysts_count = v;
        }
        if let Some(v) = patch.aggregation_ready {
            self.aggregation_ready = v;
        }
        if let Some(v) = patch.low_quality_reports {
            self.low_quality_reports = v;
        }
        if let Some(v) = patch.empty_reports {
            self.empty_reports = v;
        }

        if let Some(v) = patch.investment_debate_state {
            self.investment_debate_state = Some(match self.investment_debate_state.take() {
                Some(old) => InvestDebateState::merge(old, v),
                None => v,
            });
        }
        if let Some(v) = patch.research_debate_state {
            self.research_debate_state = Some(v);
        }
        if let Some(v) = patch.risk_debate_state {
            self.risk_debate_state = Some(match self.risk_debate_state.take() {
                Some(old) => RiskDebateState::merge(old, v),
                None => v,
            });
        }

        if let Some(v) = patch.investment_plan {
            self.investment_plan = Some(v);
        }
        if let Some(v) = patch.trader_investment_plan {
            self.trader_investment_plan = Some(v);
        }
        if let Some(v) = patch.final_trade_decision {
            self.final_trade_decision = Some(v);
        }
        if let Some(v) = patch.continue_debate {
            self.continue_debate = v;
        }
        if let Some(v) = patch.risk_analysis_needed {
            self.risk_analysis_needed = v;
        }
    }

    /// Summary of per-analyst lifecycle status, keyed by analyst kind.
    pub fn analyst_summary(&self) -> HashMap<&'static str, AnalystStatus> {
        AnalystKind::ALL
            .iter()
            .map(|k| (k.as_str(), self.status_for(*k)))
            .collect()
    }

    /// Performance summary including `parallel_efficiency`, mirroring
    /// `BackwardCompatibilityAdapter.get_performance_summary`.
    pub fn performance_summary(&self) -> PerformanceSummary {
        let times: Vec<f64> = self.analyst_execution_times.values().copied().collect();
        let parallel_efficiency = match (
            times.iter().cloned().fold(f64::MIN, f64::max),
            times.iter().cloned().fold(f64::MAX, f64::min),
        ) {
            (max, min) if !times.is_empty() && max > 0.0 => 1.0 - (max - min) / max,
            _ => 0.0,
        };
        PerformanceSummary {
            total_time: self.total_parallel_time.unwrap_or(0.0),
            speedup_factor: self.speedup_factor.unwrap_or(1.0),
            successful_analysts: self.successful_analysts_count,
            parallel_efficiency,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PerformanceSummary {
    pub total_time: f64,
    pub speedup_factor: f64,
    pub successful_analysts: u32,
    pub parallel_efficiency: f64,
}

/// A node's partial update to the Blackboard. Every field is `Option`;
/// `None` means "this node did not touch this field". The analyst status
/// fields intentionally use plain `AnalystStatus` rather than
/// `Option<AnalystStatus>` would be wrong too — keep `Option` for
/// "not touched" semantics, matching the blackboard's shallow-map model.
#[derive(Debug, Clone, Default)]
pub struct BlackboardPatch {
    pub step: Option<String>,

    pub market_report: Option<String>,
    pub news_report: Option<String>,
    pub sentiment_report: Option<String>,
    pub fundamentals_report: Option<String>,

    pub market_analyst_status: Option<AnalystStatus>,
    pub news_analyst_status: Option<AnalystStatus>,
    pub social_analyst_status: Option<AnalystStatus>,
    pub fundamentals_analyst_status: Option<AnalystStatus>,

    pub market_messages: Option<Vec<AgentMessage>>,
    pub news_messages: Option<Vec<AgentMessage>>,
    pub social_messages: Option<Vec<AgentMessage>>,
    pub fundamentals_messages: Option<Vec<AgentMessage>>,

    pub market_tool_calls: Option<u32>,
    pub news_tool_calls: Option<u32>,
    pub social_tool_calls: Option<u32>,
    pub fundamentals_tool_calls: Option<u32>,

    pub analyst_execution_times: Option<HashMap<String, f64>>,
    pub parallel_start_time: Option<f64>,
    pub parallel_end_time: Option<f64>,
    pub total_parallel_time: Option<f64>,
    pub speedup_factor: Option<f64>,

    pub analyst_errors: Option<HashMap<String, String>>,
    pub failed_analysts: Option<Vec<String>>,

    pub aggregation_status: Option<AggregationStatus>,
    pub successful_analysts_count: Option<u32>,
    pub aggregation_ready: Option<bool>,
    pub low_quality_reports: Option<bool>,
    pub empty_reports: Option<Vec<String>>,

    pub investment_debate_state: Option<InvestDebateState>,
    pub research_debate_state: Option<ResearchDebateState>,
    pub risk_debate_state: Option<RiskDebateState>,

    pub investment_plan: Option<String>,
    pub trader_investment_plan: Option<String>,
    pub final_trade_decision: Option<String>,

    pub continue_debate: Option<bool>,
    pub risk_analysis_needed: Option<bool>,
}

/// Per-analyst convenience builder for the common "mark running" /
/// "write report + status + metrics" patches analyst nodes emit.
impl BlackboardPatch {
    pub fn for_analyst_running(kind: AnalystKind) -> Self {
        let mut p = Self::default();
        match kind {
            AnalystKind::Market => p.market_analyst_status = Some(AnalystStatus::Running),
            AnalystKind::News => p.news_analyst_status = Some(AnalystStatus::Running),
            AnalystKind::Social => p.social_analyst_status = Some(AnalystStatus::Running),
            AnalystKind::Fundamentals => p.fundamentals_analyst_status = Some(AnalystStatus::Running),
        }
        p
    }

    pub fn set_report(&mut self, kind: AnalystKind, content: String) {
        match kind {
            AnalystKind::Market => self.market_report = Some(content),
            AnalystKind::News => self.news_report = Some(content),
            AnalystKind::Social => self.sentiment_report = Some(content),
            AnalystKind::Fundamentals => self.fundamentals_report = Some(content),
        }
    }

    pub fn set_status(&mut self, kind: AnalystKind, status: AnalystStatus) {
        match kind {
            AnalystKind::Market => self.market_analyst_status = Some(status),
            AnalystKind::News => self.news_analyst_status = Some(status),
            AnalystKind::Social => self.social_analyst_status = Some(status),
            AnalystKind::Fundamentals => self.fundamentals_analyst_status = Some(status),
        }
    }

    pub fn set_tool_calls(&mut self, kind: AnalystKind, count: u32) {
        match kind {
            AnalystKind::Market => self.market_tool_calls = Some(count),
            AnalystKind::News => self.news_tool_calls = Some(count),
            AnalystKind::Social => self.social_tool_calls = Some(count),
            AnalystKind::Fundamentals => self.fundamentals_tool_calls = Some(count),
        }
    }

    pub fn set_error(&mut self, kind: AnalystKind, message: String) {
        let mut m = HashMap::new();
        m.insert(kind.as_str().to_string(), message);
        self.analyst_errors = Some(m);
    }

    pub fn set_execution_time(&mut self, kind: AnalystKind, seconds: f64) {
        let mut m = HashMap::new();
        m.insert(kind.as_str().to_string(), seconds);
        self.analyst_execution_times = Some(m);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_blackboard_has_zero_values_and_identity() {
        let bb = Blackboard::new("NVDA", "2026-07-28");
        assert_eq!(bb.company_of_interest, "NVDA");
        assert_eq!(bb.trade_date, "2026-07-28");
        assert_eq!(bb.market_report, None);
        assert_eq!(bb.market_analyst_status, AnalystStatus::Pending);
        assert!(bb.risk_analysis_needed);
    }

    #[test]
    fn apply_report_patch_sets_report_and_status() {
        let mut bb = Blackboard::new("NVDA", "2026-07-28");
        let mut patch = BlackboardPatch::for_analyst_running(AnalystKind::Market);
        bb.apply(patch.clone());
        assert_eq!(bb.market_analyst_status, AnalystStatus::Running);

        patch = BlackboardPatch::default();
        patch.set_report(AnalystKind::Market, "Strong uptrend".into());
        patch.set_status(AnalystKind::Market, AnalystStatus::Completed);
        bb.apply(patch);
        assert_eq!(bb.market_report.as_deref(), Some("Strong uptrend"));
        assert_eq!(bb.market_analyst_status, AnalystStatus::Completed);
    }

    #[test]
    fn apply_merges_analyst_errors_across_branches() {
        let mut bb = Blackboard::new("NVDA", "2026-07-28");
        let mut p1 = BlackboardPatch::default();
        p1.set_error(AnalystKind::Market, "timeout".into());
        bb.apply(p1);
        let mut p2 = BlackboardPatch::default();
        p2.set_error(AnalystKind::News, "no data".into());
        bb.apply(p2);
        assert_eq!(bb.analyst_errors.get("market").unwrap(), "timeout");
        assert_eq!(bb.analyst_errors.get("news").unwrap(), "no data");
    }

    #[test]
    fn apply_merges_investment_debate_state_field_wise() {
        let mut bb = Blackboard::new("NVDA", "2026-07-28");
        let mut p1 = BlackboardPatch::default();
        p1.investment_debate_state = Some(InvestDebateState {
            bull_history: "bulls argue growth".into(),
            ..Default::default()
        });
        bb.apply(p1);
        let mut p2 = BlackboardPatch::default();
        p2.investment_debate_state = Some(InvestDebateState {
            bear_history: "bears argue valuation".into(),
            ..Default::default()
        });
        bb.apply(p2);
        let state = bb.investment_debate_state.unwrap();
        assert_eq!(state.bull_history, "bulls argue growth");
        assert_eq!(state.bear_history, "bears argue valuation");
    }
}
