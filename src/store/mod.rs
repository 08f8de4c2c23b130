//! Persistence contract for the error learning engine
//!
//! The engine depends on three store traits and never on a concrete
//! database. `MemoryStore` is the in-process reference implementation used
//! by the CLI host and the test suite; real deployments supply their own.

pub mod memory;
pub mod snapshot;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::Result;
use crate::model::{
    Category, ErrorPattern, HistoryAggregates, LearningHistoryEntry, OptimizationSuggestion,
    OptimizationType, PatternAggregates, StatsWindow, SuggestionAggregates, SuggestionStatus,
};

pub use memory::MemoryStore;

/// AND-combined filters for pattern queries
#[derive(Debug, Clone, Default)]
pub struct PatternFilter {
    pub category: Option<Category>,
    pub api_endpoint: Option<String>,
    pub min_occurrence_count: Option<u64>,
    pub min_severity_level: Option<u8>,
    pub min_confidence_score: Option<f64>,
    pub limit: Option<usize>,
}

/// AND-combined filters for suggestion queries
#[derive(Debug, Clone, Default)]
pub struct SuggestionFilter {
    pub suggestion_type: Option<OptimizationType>,
    pub status: Option<SuggestionStatus>,
    pub min_priority: Option<u8>,
    pub min_confidence_score: Option<f64>,
    pub limit: Option<usize>,
}

/// Storage contract for deduplicated error patterns
///
/// Implementations must provide atomic per-pattern create and update.
#[async_trait]
pub trait PatternStore: Send + Sync {
    /// Persist a new pattern; fails on a duplicate fingerprint
    async fn create(&self, pattern: ErrorPattern) -> Result<ErrorPattern>;

    /// Replace the stored pattern with the given one, matched by id
    async fn update(&self, pattern: &ErrorPattern) -> Result<()>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ErrorPattern>>;

    async fn get_by_hash(&self, pattern_hash: &str) -> Result<Option<ErrorPattern>>;

    /// Filtered query, ordered by occurrence count then last observation
    async fn query(&self, filter: &PatternFilter) -> Result<Vec<ErrorPattern>>;

    /// Patterns previously fed by the given recording source, ordered by
    /// confidence then occurrence count, for fuzzy matching during analysis
    async fn similarity_candidates(&self, source: &str, limit: usize)
        -> Result<Vec<ErrorPattern>>;

    /// Most frequently observed patterns at or above a severity floor
    async fn most_frequent(&self, limit: usize, min_severity: u8) -> Result<Vec<ErrorPattern>>;

    async fn aggregates(&self) -> Result<PatternAggregates>;
}

/// Storage contract for raw failure occurrences
#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn create(&self, entry: LearningHistoryEntry) -> Result<LearningHistoryEntry>;

    /// Up to `batch_size` unanalyzed entries in stable timestamp order
    async fn get_unanalyzed(&self, batch_size: usize) -> Result<Vec<LearningHistoryEntry>>;

    /// Batch-mark entries analyzed, stamping the analysis confidence.
    /// A true `contributed` flag is recorded; a false flag never reverts a
    /// contribution the recorder already established.
    async fn mark_analyzed(&self, ids: &[Uuid], contributed: bool, confidence: f64)
        -> Result<u64>;

    /// Entries recorded against one pattern, newest first
    async fn get_by_pattern(
        &self,
        pattern_id: Uuid,
        limit: usize,
    ) -> Result<Vec<LearningHistoryEntry>>;

    async fn aggregates(&self, window: &StatsWindow) -> Result<HistoryAggregates>;
}

/// Storage contract for optimization suggestions
#[async_trait]
pub trait SuggestionStore: Send + Sync {
    /// Persist a batch of suggestions, returning the stored copies
    async fn create_batch(
        &self,
        suggestions: Vec<OptimizationSuggestion>,
    ) -> Result<Vec<OptimizationSuggestion>>;

    /// Filtered query, ordered by priority then confidence, descending
    async fn query(&self, filter: &SuggestionFilter) -> Result<Vec<OptimizationSuggestion>>;

    async fn get_by_pattern(&self, pattern_id: Uuid) -> Result<Vec<OptimizationSuggestion>>;

    /// Set the lifecycle status of one suggestion. Any status is accepted
    /// from any current status; review metadata is stamped whenever the new
    /// status is past Generated.
    async fn update_status(
        &self,
        id: Uuid,
        status: SuggestionStatus,
        reviewer_notes: Option<String>,
    ) -> Result<OptimizationSuggestion>;

    async fn aggregates(&self, window: &StatsWindow) -> Result<SuggestionAggregates>;
}
