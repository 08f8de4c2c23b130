//! Batch pattern correlation
//!
//! Clusters unanalyzed history entries, reinforces existing patterns that
//! match a cluster, and marks everything analyzed. Clustering only sees one
//! fetched batch at a time: grouping (and therefore which patterns get
//! reinforced) depends on batch size and fetch order. That windowing is an
//! accepted property of the design, not something this module tries to hide.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::EngineParams;
use crate::engine::similarity::{entry_similarity, token_overlap};
use crate::errors::Result;
use crate::model::{ErrorPattern, LearningHistoryEntry};
use crate::store::{HistoryStore, PatternStore};

/// Correlates recorded failures into reinforced patterns
pub struct PatternAnalyzer {
    patterns: Arc<dyn PatternStore>,
    history: Arc<dyn HistoryStore>,
    params: EngineParams,
}

impl PatternAnalyzer {
    pub fn new(
        patterns: Arc<dyn PatternStore>,
        history: Arc<dyn HistoryStore>,
        params: EngineParams,
    ) -> Self {
        Self {
            patterns,
            history,
            params,
        }
    }

    /// Analyze one batch of unanalyzed entries
    ///
    /// Greedy single-pass clustering in fetch order, then per-cluster
    /// pattern matching and reinforcement. Every clustered entry ends up
    /// analyzed, matched or not. The cancellation token is honored between
    /// clusters: work committed before cancellation is preserved, and the
    /// call returns the patterns updated so far.
    ///
    /// Returns the number of patterns actually reinforced. Running two
    /// overlapping calls against the same unanalyzed window is not safe;
    /// the store or the host scheduler must serialize them.
    pub async fn analyze_batch(
        &self,
        batch_size: usize,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let result = self.analyze_inner(batch_size, cancel).await;
        if let Err(err) = &result {
            error!(batch_size, error = %err, "pattern analysis failed");
        }
        result
    }

    async fn analyze_inner(
        &self,
        batch_size: usize,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let entries = self.history.get_unanalyzed(batch_size).await?;
        if entries.is_empty() {
            debug!("no unanalyzed entries");
            return Ok(0);
        }

        info!(entries = entries.len(), batch_size, "analyzing batch");

        let groups = group_similar_entries(entries, self.params.similarity_threshold);
        debug!(groups = groups.len(), "clustered batch");

        let mut patterns_updated = 0;

        for group in &groups {
            if cancel.is_cancelled() {
                warn!(
                    patterns_updated,
                    "analysis cancelled; committed work preserved"
                );
                return Ok(patterns_updated);
            }

            let mut matched = false;
            if group.len() >= self.params.min_group_size {
                if let Some(pattern) = self.find_matching_pattern(group).await? {
                    self.reinforce(pattern, group).await?;
                    patterns_updated += 1;
                    matched = true;
                }
            }

            let ids: Vec<Uuid> = group.iter().map(|e| e.id).collect();
            self.history
                .mark_analyzed(&ids, matched, self.params.analyzed_confidence)
                .await?;
        }

        info!(patterns_updated, "analysis batch complete");
        Ok(patterns_updated)
    }

    /// Search same-source patterns for one whose description matches the
    /// cluster representative's message
    async fn find_matching_pattern(
        &self,
        group: &[LearningHistoryEntry],
    ) -> Result<Option<ErrorPattern>> {
        let representative = &group[0];
        let candidates = self
            .patterns
            .similarity_candidates(&representative.source, self.params.candidate_limit)
            .await?;

        for pattern in candidates {
            let score = token_overlap(&representative.error_message, &pattern.description);
            if score >= self.params.similarity_threshold {
                return Ok(Some(pattern));
            }
        }

        debug!(
            group_size = group.len(),
            source = %representative.source,
            "no matching pattern for cluster"
        );
        Ok(None)
    }

    /// Fold a cluster into an existing pattern
    async fn reinforce(
        &self,
        mut pattern: ErrorPattern,
        group: &[LearningHistoryEntry],
    ) -> Result<()> {
        pattern.occurrence_count += group.len() as u64;
        if let Some(latest) = group.iter().map(|e| e.timestamp).max() {
            if latest > pattern.last_observed {
                pattern.last_observed = latest;
            }
        }
        pattern.confidence_score = self
            .params
            .reinforced_confidence(pattern.confidence_score, group.len());

        self.patterns.update(&pattern).await?;

        debug!(
            pattern_id = %pattern.id,
            group_size = group.len(),
            occurrence_count = pattern.occurrence_count,
            "reinforced pattern"
        );
        Ok(())
    }
}

/// Greedy single-pass clustering in fetch order
///
/// Each entry joins the first group whose representative (first member)
/// scores at or above the threshold, else starts a new group.
fn group_similar_entries(
    entries: Vec<LearningHistoryEntry>,
    threshold: f64,
) -> Vec<Vec<LearningHistoryEntry>> {
    let mut groups: Vec<Vec<LearningHistoryEntry>> = Vec::new();

    for entry in entries {
        let position = groups
            .iter()
            .position(|group| entry_similarity(&entry, &group[0]) >= threshold);

        match position {
            Some(index) => groups[index].push(entry),
            None => groups.push(vec![entry]),
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Subcategory};
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn analyzer_over(store: &Arc<MemoryStore>) -> PatternAnalyzer {
        PatternAnalyzer::new(store.clone(), store.clone(), EngineParams::default())
    }

    fn entry(source: &str, message: &str, pattern_id: Uuid) -> LearningHistoryEntry {
        LearningHistoryEntry {
            id: Uuid::new_v4(),
            error_pattern_id: pattern_id,
            timestamp: Utc::now(),
            source: source.to_string(),
            test_case_name: None,
            api_name: None,
            error_message: message.to_string(),
            request_details: None,
            response_details: None,
            stack_trace: None,
            environment_context: None,
            is_analyzed: false,
            contributed_to_pattern: false,
            confidence_score: 0.4,
        }
    }

    fn pattern(hash: &str, description: &str) -> ErrorPattern {
        ErrorPattern {
            id: Uuid::new_v4(),
            pattern_hash: hash.to_string(),
            category: Category::Network,
            subcategory: Subcategory::ConnectionFailure,
            description: description.to_string(),
            http_status_code: None,
            api_endpoint: None,
            http_method: None,
            occurrence_count: 2,
            first_observed: Utc::now(),
            last_observed: Utc::now(),
            severity_level: 4,
            confidence_score: 0.5,
            context: None,
            suggested_solutions: None,
        }
    }

    #[test]
    fn test_grouping_joins_similar_entries() {
        let id = Uuid::new_v4();
        let entries = vec![
            entry("Tester", "connection refused by peer", id),
            entry("Tester", "connection refused by peer", id),
            entry("Tester", "completely different words here", id),
        ];

        let groups = group_similar_entries(entries, 0.8);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 1);
    }

    #[test]
    fn test_grouping_compares_against_representative_only() {
        let id = Uuid::new_v4();
        // Second entry matches the first; third matches the second but not
        // the representative, so it starts its own group.
        let entries = vec![
            entry("Tester", "alpha beta gamma delta epsilon", id),
            entry("Tester", "alpha beta gamma delta zeta", id),
            entry("Tester", "beta gamma delta zeta eta", id),
        ];

        let groups = group_similar_entries(entries, 0.8);
        assert_eq!(groups.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_window_returns_zero() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = analyzer_over(&store);

        let updated = analyzer
            .analyze_batch(100, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn test_cluster_without_candidate_marks_analyzed() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = analyzer_over(&store);
        let orphan_pattern = Uuid::new_v4();

        for _ in 0..3 {
            HistoryStore::create(
                store.as_ref(),
                entry("Tester", "connection refused by peer", orphan_pattern),
            )
            .await
            .unwrap();
        }

        let updated = analyzer
            .analyze_batch(100, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(updated, 0);

        let aggs = HistoryStore::aggregates(store.as_ref(), &Default::default())
            .await
            .unwrap();
        assert_eq!(aggs.analyzed_entries, 3);
        assert_eq!(aggs.unanalyzed_entries, 0);

        let analyzed = HistoryStore::get_by_pattern(store.as_ref(), orphan_pattern, 10)
            .await
            .unwrap();
        for e in analyzed {
            assert!(e.is_analyzed);
            assert_eq!(e.confidence_score, 0.8);
        }
    }

    #[tokio::test]
    async fn test_matching_cluster_reinforces_pattern() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = analyzer_over(&store);

        let existing = PatternStore::create(
            store.as_ref(),
            pattern("hashA", "connection refused by peer"),
        )
        .await
        .unwrap();

        // Tie the pattern to the source so it shows up as a candidate,
        // mirroring how the recorder would have linked them.
        let mut seed = entry("Tester", "connection refused by peer", existing.id);
        seed.is_analyzed = true;
        HistoryStore::create(store.as_ref(), seed).await.unwrap();

        for _ in 0..3 {
            HistoryStore::create(
                store.as_ref(),
                entry("Tester", "connection refused by peer", existing.id),
            )
            .await
            .unwrap();
        }

        let updated = analyzer
            .analyze_batch(100, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(updated, 1);

        let reinforced = PatternStore::get_by_id(store.as_ref(), existing.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reinforced.occurrence_count, 5);
        assert!((reinforced.confidence_score - 0.65).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_small_cluster_skips_pattern_search() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = analyzer_over(&store);

        let existing = PatternStore::create(
            store.as_ref(),
            pattern("hashA", "connection refused by peer"),
        )
        .await
        .unwrap();

        for _ in 0..2 {
            HistoryStore::create(
                store.as_ref(),
                entry("Tester", "connection refused by peer", existing.id),
            )
            .await
            .unwrap();
        }

        let updated = analyzer
            .analyze_batch(100, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(updated, 0);

        let untouched = PatternStore::get_by_id(store.as_ref(), existing.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.occurrence_count, 2);
    }

    #[tokio::test]
    async fn test_rerun_over_processed_window_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = analyzer_over(&store);
        let orphan_pattern = Uuid::new_v4();

        for _ in 0..3 {
            HistoryStore::create(
                store.as_ref(),
                entry("Tester", "connection refused by peer", orphan_pattern),
            )
            .await
            .unwrap();
        }

        analyzer
            .analyze_batch(100, &CancellationToken::new())
            .await
            .unwrap();
        let second_run = analyzer
            .analyze_batch(100, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(second_run, 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_batch_commits_nothing() {
        let store = Arc::new(MemoryStore::new());
        let analyzer = analyzer_over(&store);
        let orphan_pattern = Uuid::new_v4();

        for _ in 0..3 {
            HistoryStore::create(
                store.as_ref(),
                entry("Tester", "connection refused by peer", orphan_pattern),
            )
            .await
            .unwrap();
        }

        let cancel = CancellationToken::new();
        cancel.cancel();

        let updated = analyzer.analyze_batch(100, &cancel).await.unwrap();
        assert_eq!(updated, 0);

        let aggs = HistoryStore::aggregates(store.as_ref(), &Default::default())
            .await
            .unwrap();
        assert_eq!(aggs.unanalyzed_entries, 3);
    }
}
