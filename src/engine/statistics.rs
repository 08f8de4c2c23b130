//! Learning statistics aggregation
//!
//! Fans out to the three store aggregate queries concurrently, joins them,
//! and derives effectiveness ratios. Read-only; never mutates a store.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::model::{
    HistoryAggregates, LearningStatistics, PatternAggregates, StatsWindow, SuggestionAggregates,
};
use crate::store::{HistoryStore, PatternStore, SuggestionStore};

/// Builds derived learning statistics from the three stores
pub struct StatisticsAggregator {
    patterns: Arc<dyn PatternStore>,
    history: Arc<dyn HistoryStore>,
    suggestions: Arc<dyn SuggestionStore>,
}

impl StatisticsAggregator {
    pub fn new(
        patterns: Arc<dyn PatternStore>,
        history: Arc<dyn HistoryStore>,
        suggestions: Arc<dyn SuggestionStore>,
    ) -> Self {
        Self {
            patterns,
            history,
            suggestions,
        }
    }

    /// Compute the full statistics report for an optional time window
    ///
    /// The three aggregate queries are pure reads and run concurrently.
    pub async fn learning_statistics(&self, window: &StatsWindow) -> Result<LearningStatistics> {
        info!(from = ?window.from, to = ?window.to, "computing learning statistics");

        let joined = tokio::try_join!(
            self.patterns.aggregates(),
            self.history.aggregates(window),
            self.suggestions.aggregates(window),
        );
        let (pattern_aggs, history_aggs, suggestion_aggs) = match joined {
            Ok(aggregates) => aggregates,
            Err(err) => {
                error!(error = %err, "statistics aggregation failed");
                return Err(err);
            }
        };

        let statistics = LearningStatistics {
            total_error_patterns: pattern_aggs.total_patterns,
            total_learning_entries: history_aggs.total_entries,
            total_optimization_suggestions: suggestion_aggs.total_suggestions,
            unanalyzed_entries: history_aggs.unanalyzed_entries,
            pending_suggestions: suggestion_aggs.pending_suggestions,
            top_error_categories: pattern_aggs.category_distribution.clone(),
            top_error_endpoints: pattern_aggs.endpoint_distribution.clone(),
            average_pattern_confidence: pattern_aggs.average_confidence,
            effectiveness_metrics: effectiveness_metrics(
                &pattern_aggs,
                &history_aggs,
                &suggestion_aggs,
            ),
        };

        debug!(
            patterns = statistics.total_error_patterns,
            entries = statistics.total_learning_entries,
            suggestions = statistics.total_optimization_suggestions,
            "statistics assembled"
        );

        Ok(statistics)
    }
}

/// Derived effectiveness ratios, every division guarded against an empty
/// denominator
fn effectiveness_metrics(
    patterns: &PatternAggregates,
    history: &HistoryAggregates,
    suggestions: &SuggestionAggregates,
) -> HashMap<String, f64> {
    let mut metrics = HashMap::new();

    let total_entries = history.total_entries;
    let total_patterns = patterns.total_patterns;
    let total_suggestions = suggestions.total_suggestions;

    let analysis_rate = if total_entries > 0 {
        round2(history.analyzed_entries as f64 / total_entries as f64 * 100.0)
    } else {
        0.0
    };
    metrics.insert("AnalysisRate".to_string(), analysis_rate);

    let implementation_rate = if total_suggestions > 0 {
        round2(suggestions.implemented_suggestions as f64 / total_suggestions as f64 * 100.0)
    } else {
        0.0
    };
    metrics.insert(
        "SuggestionImplementationRate".to_string(),
        implementation_rate,
    );

    let recognition_accuracy = round2(
        (patterns.average_confidence + history.average_confidence) / 2.0 * 100.0,
    );
    metrics.insert(
        "PatternRecognitionAccuracy".to_string(),
        recognition_accuracy,
    );

    let learning_velocity = if total_entries > 0 {
        round4(total_patterns as f64 / total_entries as f64)
    } else {
        0.0
    };
    metrics.insert("LearningVelocity".to_string(), learning_velocity);

    let quality = if total_suggestions > 0 {
        let accepted = suggestions.approved_suggestions + suggestions.implemented_suggestions;
        round2(accepted as f64 / total_suggestions as f64 * 100.0)
    } else {
        0.0
    };
    metrics.insert("SuggestionQuality".to_string(), quality);

    let effectiveness = if total_patterns > 0 && total_entries > 0 {
        round2(total_entries as f64 / total_patterns as f64)
    } else {
        0.0
    };
    metrics.insert("PatternEffectiveness".to_string(), effectiveness);

    metrics
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn aggregator_over(store: &Arc<MemoryStore>) -> StatisticsAggregator {
        StatisticsAggregator::new(store.clone(), store.clone(), store.clone())
    }

    #[tokio::test]
    async fn test_empty_store_yields_zeroed_statistics() {
        let store = Arc::new(MemoryStore::new());
        let aggregator = aggregator_over(&store);

        let stats = aggregator
            .learning_statistics(&StatsWindow::unbounded())
            .await
            .unwrap();

        assert_eq!(stats.total_learning_entries, 0);
        assert_eq!(stats.total_error_patterns, 0);
        assert_eq!(stats.effectiveness_metrics["AnalysisRate"], 0.0);
        assert_eq!(stats.effectiveness_metrics["SuggestionImplementationRate"], 0.0);
        assert_eq!(stats.effectiveness_metrics["LearningVelocity"], 0.0);
        assert_eq!(stats.effectiveness_metrics["SuggestionQuality"], 0.0);
        assert_eq!(stats.effectiveness_metrics["PatternEffectiveness"], 0.0);
    }

    #[test]
    fn test_analysis_rate_rounding() {
        let history = HistoryAggregates {
            total_entries: 3,
            analyzed_entries: 1,
            ..Default::default()
        };
        let metrics = effectiveness_metrics(
            &PatternAggregates::default(),
            &history,
            &SuggestionAggregates::default(),
        );
        assert_eq!(metrics["AnalysisRate"], 33.33);
    }

    #[test]
    fn test_learning_velocity_rounds_to_four_decimals() {
        let patterns = PatternAggregates {
            total_patterns: 1,
            ..Default::default()
        };
        let history = HistoryAggregates {
            total_entries: 3,
            ..Default::default()
        };
        let metrics =
            effectiveness_metrics(&patterns, &history, &SuggestionAggregates::default());
        assert_eq!(metrics["LearningVelocity"], 0.3333);
    }

    #[test]
    fn test_recognition_accuracy_averages_confidences() {
        let patterns = PatternAggregates {
            average_confidence: 0.6,
            ..Default::default()
        };
        let history = HistoryAggregates {
            average_confidence: 0.8,
            ..Default::default()
        };
        let metrics =
            effectiveness_metrics(&patterns, &history, &SuggestionAggregates::default());
        assert_eq!(metrics["PatternRecognitionAccuracy"], 70.0);
    }

    #[test]
    fn test_suggestion_quality_counts_approved_and_implemented() {
        let suggestions = SuggestionAggregates {
            total_suggestions: 4,
            approved_suggestions: 1,
            implemented_suggestions: 1,
            ..Default::default()
        };
        let metrics = effectiveness_metrics(
            &PatternAggregates::default(),
            &HistoryAggregates::default(),
            &suggestions,
        );
        assert_eq!(metrics["SuggestionQuality"], 50.0);
        assert_eq!(metrics["SuggestionImplementationRate"], 25.0);
    }

    #[test]
    fn test_pattern_effectiveness_ratio() {
        let patterns = PatternAggregates {
            total_patterns: 4,
            ..Default::default()
        };
        let history = HistoryAggregates {
            total_entries: 10,
            ..Default::default()
        };
        let metrics =
            effectiveness_metrics(&patterns, &history, &SuggestionAggregates::default());
        assert_eq!(metrics["PatternEffectiveness"], 2.5);
    }
}
