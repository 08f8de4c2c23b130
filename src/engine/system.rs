//! Learning system facade
//!
//! One coherent interface over the four focused services. Holds no logic of
//! its own; every call delegates.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::EngineParams;
use crate::engine::analyzer::PatternAnalyzer;
use crate::engine::recorder::ErrorRecorder;
use crate::engine::statistics::StatisticsAggregator;
use crate::engine::suggestions::SuggestionGenerator;
use crate::errors::Result;
use crate::model::{
    ErrorPattern, ErrorReport, LearningHistoryEntry, LearningStatistics, OptimizationSuggestion,
    StatsWindow, SuggestionStatus,
};
use crate::store::{
    HistoryStore, PatternFilter, PatternStore, SuggestionFilter, SuggestionStore,
};

/// Facade over the error learning engine
pub struct LearningSystem {
    recorder: ErrorRecorder,
    analyzer: PatternAnalyzer,
    generator: SuggestionGenerator,
    aggregator: StatisticsAggregator,
    patterns: Arc<dyn PatternStore>,
    history: Arc<dyn HistoryStore>,
    params: EngineParams,
}

impl LearningSystem {
    /// Compose the engine over the three store contracts
    pub fn new(
        patterns: Arc<dyn PatternStore>,
        history: Arc<dyn HistoryStore>,
        suggestions: Arc<dyn SuggestionStore>,
        params: EngineParams,
    ) -> Self {
        Self {
            recorder: ErrorRecorder::new(patterns.clone(), history.clone(), params.clone()),
            analyzer: PatternAnalyzer::new(patterns.clone(), history.clone(), params.clone()),
            generator: SuggestionGenerator::new(patterns.clone(), suggestions.clone()),
            aggregator: StatisticsAggregator::new(
                patterns.clone(),
                history.clone(),
                suggestions,
            ),
            patterns,
            history,
            params,
        }
    }

    /// Compose with default engine parameters
    pub fn with_default_params(
        patterns: Arc<dyn PatternStore>,
        history: Arc<dyn HistoryStore>,
        suggestions: Arc<dyn SuggestionStore>,
    ) -> Self {
        Self::new(patterns, history, suggestions, EngineParams::default())
    }

    /// Record one failure occurrence
    pub async fn record_error(&self, report: ErrorReport) -> Result<LearningHistoryEntry> {
        self.recorder.record(report).await
    }

    /// Run one pattern-analysis batch
    pub async fn analyze_patterns(&self, batch_size: usize) -> Result<usize> {
        self.analyzer
            .analyze_batch(batch_size, &CancellationToken::new())
            .await
    }

    /// Run one pattern-analysis batch under a cancellation token
    pub async fn analyze_patterns_with_cancel(
        &self,
        batch_size: usize,
        cancel: &CancellationToken,
    ) -> Result<usize> {
        self.analyzer.analyze_batch(batch_size, cancel).await
    }

    /// Filtered pattern query
    pub async fn error_patterns(&self, filter: &PatternFilter) -> Result<Vec<ErrorPattern>> {
        self.patterns.query(filter).await
    }

    /// Most frequently observed patterns at or above a severity floor
    pub async fn most_frequent_patterns(
        &self,
        limit: usize,
        min_severity: u8,
    ) -> Result<Vec<ErrorPattern>> {
        self.patterns.most_frequent(limit, min_severity).await
    }

    /// History entries recorded against one pattern, newest first
    pub async fn learning_history(
        &self,
        pattern_id: Uuid,
        limit: usize,
    ) -> Result<Vec<LearningHistoryEntry>> {
        self.history.get_by_pattern(pattern_id, limit).await
    }

    /// Generate suggestions for one pattern
    pub async fn generate_suggestions(
        &self,
        pattern_id: Uuid,
    ) -> Result<Vec<OptimizationSuggestion>> {
        self.generator.generate_for_pattern(pattern_id).await
    }

    /// Filtered suggestion query
    pub async fn optimization_suggestions(
        &self,
        filter: &SuggestionFilter,
    ) -> Result<Vec<OptimizationSuggestion>> {
        self.generator.query(filter).await
    }

    /// Suggestions previously generated for one pattern, newest first
    pub async fn suggestions_for_pattern(
        &self,
        pattern_id: Uuid,
    ) -> Result<Vec<OptimizationSuggestion>> {
        self.generator.for_pattern(pattern_id).await
    }

    /// Update the review status of one suggestion
    pub async fn update_suggestion_status(
        &self,
        suggestion_id: Uuid,
        status: SuggestionStatus,
        reviewer_notes: Option<String>,
    ) -> Result<OptimizationSuggestion> {
        self.generator
            .update_status(suggestion_id, status, reviewer_notes)
            .await
    }

    /// Learning statistics for an optional time window
    pub async fn learning_statistics(&self, window: &StatsWindow) -> Result<LearningStatistics> {
        self.aggregator.learning_statistics(window).await
    }

    /// Engine parameters this system was composed with
    pub fn params(&self) -> &EngineParams {
        &self.params
    }
}
