//! Data model for the error learning engine
//!
//! Aggregates stored through the persistence contract (patterns, history
//! entries, suggestions) plus the derived statistics types.

pub mod history;
pub mod pattern;
pub mod statistics;
pub mod suggestion;

pub use history::{ErrorReport, LearningHistoryEntry};
pub use pattern::{Category, ErrorPattern, Subcategory};
pub use statistics::{
    HistoryAggregates, LearningStatistics, PatternAggregates, StatsWindow, SuggestionAggregates,
};
pub use suggestion::{OptimizationSuggestion, OptimizationType, SuggestionStatus};
