use serde::{Deserialize, Serialize};

/// State of the bull/bear research debate.
///
/// Field-wise merge preserving non-empty values (`merge_debate` in the
/// reducer catalog): when two branches each contribute one side of the
/// debate, neither side's history is clobbered by the other's blank value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvestDebateState {
    #[serde(default)]
    pub bull_history: String,
    #[serde(default)]
    pub bear_history: String,
    #[serde(default)]
    pub history: String,
    #[serde(default)]
    pub current_response: String,
    #[serde(default)]
    pub judge_decision: String,
    #[serde(default)]
    pub count: u32,
}

impl InvestDebateState {
    /// Field-wise merge: a non-empty value from `new` wins, otherwise keep `old`.
    pub fn merge(old: Self, new: Self) -> Self {
        Self {
            bull_history: pick(old.bull_history, new.bull_history),
            bear_history: pick(old.bear_history, new.bear_history),
            history: pick(old.history, new.history),
            current_response: pick(old.current_response, new.current_response),
            judge_decision: pick(old.judge_decision, new.judge_decision),
            count: new.count.max(old.count),
        }
    }
}

/// Separate round-tracking record for the research-debate controller loop
/// Distinct from `investment_debate_state`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchDebateState {
    #[serde(default)]
    pub current_round: u32,
    pub max_rounds: u32,
    #[serde(default)]
    pub debate_history: Vec<String>,
    #[serde(default)]
    pub consensus_reached: bool,
}

/// State of the risky/safe/neutral risk debate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskDebateState {
    #[serde(default)]
    pub risky_history: String,
    #[serde(default)]
    pub safe_history: String,
    #[serde(default)]
    pub neutral_history: String,
    #[serde(default)]
    pub history: String,
    #[serde(default)]
    pub latest_speaker: String,
    #[serde(default)]
    pub current_risky_response: String,
    #[serde(default)]
    pub current_safe_response: String,
    #[serde(default)]
    pub current_neutral_response: String,
    #[serde(default)]
    pub judge_decision: String,
    #[serde(default)]
    pub count: u32,
}

impl RiskDebateState {
    pub fn merge(old: Self, new: Self) -> Self {
        Self {
            risky_history: pick(old.risky_history, new.risky_history),
            safe_history: pick(old.safe_history, new.safe_history),
            neutral_history: pick(old.neutral_history, new.neutral_history),
            history: pick(old.history, new.history),
            latest_speaker: pick(old.latest_speaker, new.latest_speaker),
            current_risky_response: pick(old.current_risky_response, new.current_risky_response),
            current_safe_response: pick(old.current_safe_response, new.current_safe_response),
            current_neutral_response: pick(old.current_neutral_response, new.current_neutral_response),
            judge_decision: pick(old.judge_decision, new.judge_decision),
            count: new.count.max(old.count),
        }
    }

    /// The risk manager's gating predicate: only treat the
    /// debate as "already happened" once its combined history has
    /// substantive content, not merely a non-empty string.
    pub fn has_substantive_history(&self) -> bool {
        self.history.len() > 100
    }
}

fn pick(old: String, new: String) -> String {
    if new.is_empty() { old } else { new }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invest_debate_merge_preserves_non_empty_sides() {
        let a = InvestDebateState {
            bull_history: "bulls say buy".into(),
            ..Default::default()
        };
        let b = InvestDebateState {
            bear_history: "bears say sell".into(),
            ..Default::default()
        };
        let merged = InvestDebateState::merge(a, b);
        assert_eq!(merged.bull_history, "bulls say buy");
        assert_eq!(merged.bear_history, "bears say sell");
    }

    #[test]
    fn risk_debate_substantive_history_threshold() {
        let short = RiskDebateState { history: "short".into(), ..Default::default() };
        assert!(!short.has_substantive_history());
        let long = RiskDebateState { history: "x".repeat(101), ..Default::default() };
        assert!(long.has_substantive_history());
    }
}
