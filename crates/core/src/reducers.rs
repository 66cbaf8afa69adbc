//! Per-field merge semantics for the Blackboard.
//!
//! Reducers must be commutative and associative for fields that can receive
//! concurrent writes from a Send fan-out. Report fields are exclusive per
//! analyst and use `replace`.

use crate::messages::AgentMessage;
use std::collections::HashMap;

/// New value wins. Used for scalars and most reports.
pub fn replace<T>(_old: Option<T>, new: T) -> T {
    new
}

/// Concatenate preserving order, dropping duplicates by message id.
pub fn append_messages(old: Vec<AgentMessage>, new: Vec<AgentMessage>) -> Vec<AgentMessage> {
    let mut seen: std::collections::HashSet<String> =
        old.iter().map(|m| m.id.clone()).collect();
    let mut merged = old;
    for m in new {
        if seen.insert(m.id.clone()) {
            merged.push(m);
        }
    }
    merged
}

/// Key-wise union; right (new) wins on collision.
pub fn merge_map<V: Clone>(
    old: Option<HashMap<String, V>>,
    new: Option<HashMap<String, V>>,
) -> Option<HashMap<String, V>> {
    match (old, new) {
        (None, None) => None,
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (Some(mut l), Some(r)) => {
            l.extend(r);
            Some(l)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{AgentMessage, MessageRole};

    fn msg(id: &str, content: &str) -> AgentMessage {
        AgentMessage {
            id: id.to_string(),
            role: MessageRole::User,
            content: content.to_string(),
            tool_name: None,
            tool_call_id: None,
        }
    }

    #[test]
    fn append_messages_dedups_by_id() {
        let old = vec![msg("a", "one")];
        let new = vec![msg("a", "one-dup"), msg("b", "two")];
        let merged = append_messages(old, new);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "a");
        assert_eq!(merged[0].content, "one"); // old entry wins, not overwritten
        assert_eq!(merged[1].id, "b");
    }

    #[test]
    fn merge_map_right_wins_on_collision() {
        let mut l = HashMap::new();
        l.insert("market".to_string(), "timeout".to_string());
        let mut r = HashMap::new();
        r.insert("market".to_string(), "connection refused".to_string());
        r.insert("news".to_string(), "no data".to_string());
        let merged = merge_map(Some(l), Some(r)).unwrap();
        assert_eq!(merged.get("market").unwrap(), "connection refused");
        assert_eq!(merged.get("news").unwrap(), "no data");
    }

    #[test]
    fn merge_map_none_either_side() {
        assert_eq!(merge_map::<String>(None, None), None);
        let mut r = HashMap::new();
        r.insert("k".to_string(), "v".to_string());
        assert_eq!(merge_map(None, Some(r.clone())), Some(r));
    }
}
