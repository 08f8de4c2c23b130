//! Error recording service
//!
//! Normalizes and fingerprints one reported failure, folds it into an
//! existing pattern or founds a new one, and appends the history entry.

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::EngineParams;
use crate::engine::classify::{classify, describe, severity};
use crate::engine::fingerprint::{fingerprint_normalized, normalize_message};
use crate::errors::Result;
use crate::model::{ErrorPattern, ErrorReport, LearningHistoryEntry};
use crate::store::{HistoryStore, PatternStore};

/// Records raw failures and maintains their deduplicated patterns
pub struct ErrorRecorder {
    patterns: Arc<dyn PatternStore>,
    history: Arc<dyn HistoryStore>,
    params: EngineParams,
}

impl ErrorRecorder {
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

    /// Record one failure occurrence
    ///
    /// Validates the report before any store access, then matches the
    /// fingerprint against existing patterns. An exact match bumps the
    /// pattern's count and confidence; a miss founds a new pattern through
    /// the classifier. Returns the persisted history entry. Store failures
    /// are logged and propagated; no retry is attempted here.
    pub async fn record(&self, report: ErrorReport) -> Result<LearningHistoryEntry> {
        report.validate()?;

        let source = report.source.clone();
        let result = self.record_validated(report).await;
        if let Err(err) = &result {
            error!(%source, error = %err, "failed to record failure");
        }
        result
    }

    async fn record_validated(&self, report: ErrorReport) -> Result<LearningHistoryEntry> {
        info!(source = %report.source, "recording failure");

        let normalized = normalize_message(&report.error_message);
        let hash = fingerprint_normalized(
            &normalized,
            report.api_endpoint.as_deref(),
            report.http_method.as_deref(),
            report.http_status_code,
        );

        let now = Utc::now();

        let (pattern, contributed) = match self.patterns.get_by_hash(&hash).await? {
            Some(mut existing) => {
                existing.occurrence_count += 1;
                existing.last_observed = now;
                existing.confidence_score =
                    self.params.confidence_for(existing.occurrence_count);
                self.patterns.update(&existing).await?;

                debug!(
                    pattern_id = %existing.id,
                    occurrence_count = existing.occurrence_count,
                    "matched existing pattern"
                );
                (existing, true)
            }
            None => {
                let pattern = self.found_pattern(&report, &normalized, hash);
                let created = self.patterns.create(pattern).await?;

                info!(
                    pattern_id = %created.id,
                    category = %created.category,
                    subcategory = %created.subcategory,
                    severity = created.severity_level,
                    "created new pattern"
                );
                (created, false)
            }
        };

        let entry = LearningHistoryEntry {
            id: Uuid::new_v4(),
            error_pattern_id: pattern.id,
            timestamp: now,
            source: report.source,
            test_case_name: report.test_case_name,
            api_name: report.api_name,
            error_message: report.error_message,
            request_details: report.request_details,
            response_details: report.response_details,
            stack_trace: report.stack_trace,
            environment_context: report.environment_context,
            is_analyzed: false,
            contributed_to_pattern: contributed,
            confidence_score: pattern.confidence_score,
        };

        let saved = self.history.create(entry).await?;
        debug!(entry_id = %saved.id, "failure recorded");

        Ok(saved)
    }

    /// Build the founding pattern for a fingerprint seen for the first time
    fn found_pattern(
        &self,
        report: &ErrorReport,
        normalized_message: &str,
        pattern_hash: String,
    ) -> ErrorPattern {
        let classification = classify(normalized_message, report.http_status_code);
        let severity_level = severity(normalized_message, report.http_status_code);
        let description = describe(
            normalized_message,
            report.api_endpoint.as_deref(),
            report.http_method.as_deref(),
        );

        let now = Utc::now();
        ErrorPattern {
            id: Uuid::new_v4(),
            pattern_hash,
            category: classification.category,
            subcategory: classification.subcategory,
            description,
            http_status_code: report.http_status_code,
            api_endpoint: report.api_endpoint.clone(),
            http_method: report.http_method.clone(),
            occurrence_count: 1,
            first_observed: now,
            last_observed: now,
            severity_level,
            confidence_score: self.params.confidence_for(1),
            context: None,
            suggested_solutions: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LearnError;
    use crate::model::{Category, Subcategory};
    use crate::store::MemoryStore;

    fn recorder_over(store: &Arc<MemoryStore>) -> ErrorRecorder {
        ErrorRecorder::new(
            store.clone(),
            store.clone(),
            EngineParams::default(),
        )
    }

    fn timeout_report() -> ErrorReport {
        ErrorReport::new(
            "Tester",
            "Timeout waiting for response from https://api.example.com/v1/items",
        )
        .with_endpoint("/v1/items")
        .with_method("GET")
    }

    #[tokio::test]
    async fn test_first_occurrence_founds_pattern() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(&store);

        let entry = recorder.record(timeout_report()).await.unwrap();
        assert!(!entry.contributed_to_pattern);
        assert!(!entry.is_analyzed);

        let pattern = PatternStore::get_by_id(store.as_ref(), entry.error_pattern_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pattern.category, Category::Network);
        assert_eq!(pattern.subcategory, Subcategory::Timeout);
        assert_eq!(pattern.severity_level, 4);
        assert_eq!(pattern.occurrence_count, 1);
        assert!((pattern.confidence_score - 0.4).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_repeat_occurrences_reinforce_pattern() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(&store);

        let mut last_entry = None;
        for _ in 0..5 {
            last_entry = Some(recorder.record(timeout_report()).await.unwrap());
        }

        let entry = last_entry.unwrap();
        assert!(entry.contributed_to_pattern);

        let pattern = PatternStore::get_by_id(store.as_ref(), entry.error_pattern_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pattern.occurrence_count, 5);
        assert!((pattern.confidence_score - 0.8).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_occurrence_count_never_decreases() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(&store);

        let mut previous = 0;
        for _ in 0..8 {
            let entry = recorder.record(timeout_report()).await.unwrap();
            let pattern = PatternStore::get_by_id(store.as_ref(), entry.error_pattern_id)
                .await
                .unwrap()
                .unwrap();
            assert!(pattern.occurrence_count > previous);
            previous = pattern.occurrence_count;
        }
    }

    #[tokio::test]
    async fn test_confidence_never_exceeds_cap() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(&store);

        for _ in 0..20 {
            let entry = recorder.record(timeout_report()).await.unwrap();
            assert!(entry.confidence_score <= 0.95);
        }
    }

    #[tokio::test]
    async fn test_variable_data_folds_into_same_pattern() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(&store);

        let first = recorder
            .record(ErrorReport::new("Tester", "order 123 timed out, timeout after 30s"))
            .await
            .unwrap();
        let second = recorder
            .record(ErrorReport::new("Tester", "order 456 timed out, timeout after 60s"))
            .await
            .unwrap();

        assert_eq!(first.error_pattern_id, second.error_pattern_id);
        assert!(second.contributed_to_pattern);
    }

    #[tokio::test]
    async fn test_rate_limited_classification() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(&store);

        let entry = recorder
            .record(
                ErrorReport::new("Tester", "too many requests")
                    .with_endpoint("/v1/orders")
                    .with_status(429),
            )
            .await
            .unwrap();

        let pattern = PatternStore::get_by_id(store.as_ref(), entry.error_pattern_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(pattern.category, Category::Http);
        assert_eq!(pattern.subcategory, Subcategory::RateLimited);
        assert_eq!(pattern.severity_level, 4);
    }

    #[tokio::test]
    async fn test_empty_source_rejected_before_persistence() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(&store);

        let result = recorder.record(ErrorReport::new("", "boom")).await;
        assert!(matches!(result, Err(LearnError::Validation(_))));

        let aggs = HistoryStore::aggregates(store.as_ref(), &Default::default())
            .await
            .unwrap();
        assert_eq!(aggs.total_entries, 0);
    }

    #[tokio::test]
    async fn test_empty_message_rejected() {
        let store = Arc::new(MemoryStore::new());
        let recorder = recorder_over(&store);

        let result = recorder.record(ErrorReport::new("Tester", "   ")).await;
        assert!(matches!(result, Err(LearnError::Validation(_))));
    }
}
