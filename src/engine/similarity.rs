//! Token-overlap similarity used by the batch analyzer
//!
//! Deliberately simple: shared lowercase words over the longer message's
//! word count, plus exact-match terms for api name and source. No semantic
//! understanding beyond that.

use std::collections::HashSet;

use crate::model::LearningHistoryEntry;

/// Weight of message overlap in the combined entry similarity
const MESSAGE_WEIGHT: f64 = 0.6;
/// Weight of an exact api-name match
const API_WEIGHT: f64 = 0.2;
/// Weight of an exact source match
const SOURCE_WEIGHT: f64 = 0.2;

/// Shared-word ratio between two strings, in [0, 1]
///
/// `|common lowercase words| / max(word count a, word count b)`; empty
/// input scores 0, case-insensitive equality scores 1.
pub fn token_overlap(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let lower_a = a.to_lowercase();
    let lower_b = b.to_lowercase();
    if lower_a == lower_b {
        return 1.0;
    }

    let words_a: Vec<&str> = lower_a.split_whitespace().collect();
    let words_b: Vec<&str> = lower_b.split_whitespace().collect();

    let set_a: HashSet<&str> = words_a.iter().copied().collect();
    let set_b: HashSet<&str> = words_b.iter().copied().collect();

    let common = set_a.intersection(&set_b).count();
    let total = words_a.len().max(words_b.len());

    if total == 0 {
        0.0
    } else {
        common as f64 / total as f64
    }
}

/// Weighted similarity between an entry and a cluster representative
///
/// 0.6 × message overlap + 0.2 × api-name equality + 0.2 × source equality.
pub fn entry_similarity(entry: &LearningHistoryEntry, representative: &LearningHistoryEntry) -> f64 {
    let message = token_overlap(&entry.error_message, &representative.error_message);
    let api = if opt_eq_ignore_case(&entry.api_name, &representative.api_name) {
        1.0
    } else {
        0.0
    };
    let source = if entry.source.eq_ignore_ascii_case(&representative.source) {
        1.0
    } else {
        0.0
    };

    message * MESSAGE_WEIGHT + api * API_WEIGHT + source * SOURCE_WEIGHT
}

/// Case-insensitive equality where two absent values count as equal
fn opt_eq_ignore_case(a: &Option<String>, b: &Option<String>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn entry(source: &str, api: Option<&str>, message: &str) -> LearningHistoryEntry {
        LearningHistoryEntry {
            id: Uuid::new_v4(),
            error_pattern_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.to_string(),
            test_case_name: None,
            api_name: api.map(|a| a.to_string()),
            error_message: message.to_string(),
            request_details: None,
            response_details: None,
            stack_trace: None,
            environment_context: None,
            is_analyzed: false,
            contributed_to_pattern: false,
            confidence_score: 0.0,
        }
    }

    #[test]
    fn test_identical_strings_score_one() {
        assert_eq!(token_overlap("connection refused", "Connection REFUSED"), 1.0);
    }

    #[test]
    fn test_empty_string_scores_zero() {
        assert_eq!(token_overlap("", "connection refused"), 0.0);
        assert_eq!(token_overlap("connection refused", ""), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        // 2 shared words over max(3, 3)
        let score = token_overlap("connection refused peer", "connection refused again");
        assert!((score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_disjoint_messages_score_zero() {
        assert_eq!(token_overlap("alpha beta", "gamma delta"), 0.0);
    }

    #[test]
    fn test_overlap_uses_longer_message_as_denominator() {
        let score = token_overlap("timeout", "timeout while waiting for upstream");
        assert!((score - 1.0 / 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_entries_score_one() {
        let a = entry("Tester", Some("Items"), "connection refused");
        let b = entry("Tester", Some("Items"), "connection refused");
        assert!((entry_similarity(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_source_mismatch_costs_its_weight() {
        let a = entry("Tester", Some("Items"), "connection refused");
        let b = entry("OtherSource", Some("Items"), "connection refused");
        assert!((entry_similarity(&a, &b) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_missing_api_names_count_as_equal() {
        let a = entry("Tester", None, "connection refused");
        let b = entry("Tester", None, "connection refused");
        assert!((entry_similarity(&a, &b) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_one_sided_api_name_does_not_match() {
        let a = entry("Tester", Some("Items"), "connection refused");
        let b = entry("Tester", None, "connection refused");
        assert!((entry_similarity(&a, &b) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_similarity_bounded() {
        let a = entry("Tester", Some("Items"), "alpha beta gamma");
        let b = entry("Other", None, "delta epsilon");
        let score = entry_similarity(&a, &b);
        assert!((0.0..=1.0).contains(&score));
    }
}
