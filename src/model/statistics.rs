use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Optional time window applied to history and suggestion aggregates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct StatsWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl StatsWindow {
    /// Window covering all recorded data
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// Whether a timestamp falls inside the window (bounds inclusive)
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        if let Some(from) = self.from {
            if timestamp < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if timestamp > to {
                return false;
            }
        }
        true
    }
}

/// Aggregate counts reported by a pattern store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatternAggregates {
    pub total_patterns: u64,
    pub high_severity_patterns: u64,
    /// Pattern count per category name
    pub category_distribution: HashMap<String, u64>,
    /// Occurrence count per API endpoint
    pub endpoint_distribution: HashMap<String, u64>,
    /// Mean confidence over patterns with a positive score
    pub average_confidence: f64,
}

/// Aggregate counts reported by a history store, optionally windowed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryAggregates {
    pub total_entries: u64,
    pub analyzed_entries: u64,
    pub unanalyzed_entries: u64,
    pub contributed_entries: u64,
    /// Entry count per recording source
    pub source_distribution: HashMap<String, u64>,
    pub average_confidence: f64,
}

/// Aggregate counts reported by a suggestion store, optionally windowed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuggestionAggregates {
    pub total_suggestions: u64,
    /// Generated or Reviewed, still awaiting a decision
    pub pending_suggestions: u64,
    pub approved_suggestions: u64,
    pub implemented_suggestions: u64,
    pub rejected_suggestions: u64,
    pub type_distribution: HashMap<String, u64>,
    pub status_distribution: HashMap<String, u64>,
}

/// Derived learning metrics; recomputed on demand, never persisted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LearningStatistics {
    pub total_error_patterns: u64,
    pub total_learning_entries: u64,
    pub total_optimization_suggestions: u64,
    pub unanalyzed_entries: u64,
    pub pending_suggestions: u64,
    pub top_error_categories: HashMap<String, u64>,
    pub top_error_endpoints: HashMap<String, u64>,
    pub average_pattern_confidence: f64,
    /// Keyed metrics: AnalysisRate, SuggestionImplementationRate,
    /// PatternRecognitionAccuracy, LearningVelocity, SuggestionQuality,
    /// PatternEffectiveness
    pub effectiveness_metrics: HashMap<String, f64>,
}
