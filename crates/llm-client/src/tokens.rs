/// Minimal token counter for LLM-driven nodes. A real tokenizer is heavy
/// and largely unused by the nodes that matter most here, so this stays a
/// char-count heuristic: logging-only, never gating correctness.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_is_a_coarse_heuristic() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens(&"x".repeat(100)), 25);
    }
}
