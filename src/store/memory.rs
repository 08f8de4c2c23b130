//! In-memory reference implementation of the three store contracts
//!
//! Backs the CLI host and the test suite. Each table sits behind its own
//! `RwLock`, so per-aggregate create/update is atomic as the contract
//! requires. Not a database: everything lives on the heap until the CLI
//! snapshots it to disk.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::{LearnError, Result};
use crate::model::{
    ErrorPattern, HistoryAggregates, LearningHistoryEntry, OptimizationSuggestion,
    PatternAggregates, StatsWindow, SuggestionAggregates, SuggestionStatus,
};
use crate::store::{
    HistoryStore, PatternFilter, PatternStore, SuggestionFilter, SuggestionStore,
};

/// Full store contents, used for JSON snapshots
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct StoreSnapshot {
    pub patterns: Vec<ErrorPattern>,
    pub entries: Vec<LearningHistoryEntry>,
    pub suggestions: Vec<OptimizationSuggestion>,
}

#[derive(Default)]
struct PatternTable {
    by_id: HashMap<Uuid, ErrorPattern>,
    by_hash: HashMap<String, Uuid>,
}

/// In-memory store implementing all three persistence contracts
#[derive(Default)]
pub struct MemoryStore {
    patterns: RwLock<PatternTable>,
    entries: RwLock<HashMap<Uuid, LearningHistoryEntry>>,
    suggestions: RwLock<HashMap<Uuid, OptimizationSuggestion>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a store from snapshot contents
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut table = PatternTable::default();
        for pattern in snapshot.patterns {
            table.by_hash.insert(pattern.pattern_hash.clone(), pattern.id);
            table.by_id.insert(pattern.id, pattern);
        }

        let entries = snapshot
            .entries
            .into_iter()
            .map(|entry| (entry.id, entry))
            .collect();

        let suggestions = snapshot
            .suggestions
            .into_iter()
            .map(|suggestion| (suggestion.id, suggestion))
            .collect();

        Self {
            patterns: RwLock::new(table),
            entries: RwLock::new(entries),
            suggestions: RwLock::new(suggestions),
        }
    }

    /// Capture the full store contents
    pub async fn snapshot(&self) -> StoreSnapshot {
        let patterns = self.patterns.read().await;
        let entries = self.entries.read().await;
        let suggestions = self.suggestions.read().await;

        let mut snapshot = StoreSnapshot {
            patterns: patterns.by_id.values().cloned().collect(),
            entries: entries.values().cloned().collect(),
            suggestions: suggestions.values().cloned().collect(),
        };

        // Stable file output for diffing snapshots
        snapshot.patterns.sort_by_key(|p| (p.first_observed, p.id));
        snapshot.entries.sort_by_key(|e| (e.timestamp, e.id));
        snapshot.suggestions.sort_by_key(|s| (s.generated_at, s.id));

        snapshot
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[async_trait]
impl PatternStore for MemoryStore {
    async fn create(&self, pattern: ErrorPattern) -> Result<ErrorPattern> {
        let mut table = self.patterns.write().await;
        if table.by_hash.contains_key(&pattern.pattern_hash) {
            return Err(LearnError::DuplicateHash(pattern.pattern_hash));
        }
        table.by_hash.insert(pattern.pattern_hash.clone(), pattern.id);
        table.by_id.insert(pattern.id, pattern.clone());
        Ok(pattern)
    }

    async fn update(&self, pattern: &ErrorPattern) -> Result<()> {
        let mut table = self.patterns.write().await;
        if !table.by_id.contains_key(&pattern.id) {
            return Err(LearnError::PatternNotFound(pattern.id));
        }
        table.by_id.insert(pattern.id, pattern.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<ErrorPattern>> {
        let table = self.patterns.read().await;
        Ok(table.by_id.get(&id).cloned())
    }

    async fn get_by_hash(&self, pattern_hash: &str) -> Result<Option<ErrorPattern>> {
        let table = self.patterns.read().await;
        Ok(table
            .by_hash
            .get(pattern_hash)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn query(&self, filter: &PatternFilter) -> Result<Vec<ErrorPattern>> {
        let table = self.patterns.read().await;
        let mut matches: Vec<ErrorPattern> = table
            .by_id
            .values()
            .filter(|p| filter.category.map_or(true, |c| p.category == c))
            .filter(|p| {
                filter
                    .api_endpoint
                    .as_deref()
                    .map_or(true, |e| p.api_endpoint.as_deref() == Some(e))
            })
            .filter(|p| {
                filter
                    .min_occurrence_count
                    .map_or(true, |n| p.occurrence_count >= n)
            })
            .filter(|p| {
                filter
                    .min_severity_level
                    .map_or(true, |s| p.severity_level >= s)
            })
            .filter(|p| {
                filter
                    .min_confidence_score
                    .map_or(true, |c| p.confidence_score >= c)
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then(b.last_observed.cmp(&a.last_observed))
        });
        matches.truncate(filter.limit.unwrap_or(100));
        Ok(matches)
    }

    async fn similarity_candidates(
        &self,
        source: &str,
        limit: usize,
    ) -> Result<Vec<ErrorPattern>> {
        let entries = self.entries.read().await;
        let pattern_ids: std::collections::HashSet<Uuid> = entries
            .values()
            .filter(|e| e.source.eq_ignore_ascii_case(source))
            .map(|e| e.error_pattern_id)
            .collect();
        drop(entries);

        let table = self.patterns.read().await;
        let mut candidates: Vec<ErrorPattern> = pattern_ids
            .iter()
            .filter_map(|id| table.by_id.get(id))
            .cloned()
            .collect();

        candidates.sort_by(|a, b| {
            b.confidence_score
                .partial_cmp(&a.confidence_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.occurrence_count.cmp(&a.occurrence_count))
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn most_frequent(&self, limit: usize, min_severity: u8) -> Result<Vec<ErrorPattern>> {
        let table = self.patterns.read().await;
        let mut matches: Vec<ErrorPattern> = table
            .by_id
            .values()
            .filter(|p| p.severity_level >= min_severity)
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then(b.severity_level.cmp(&a.severity_level))
        });
        matches.truncate(limit);
        Ok(matches)
    }

    async fn aggregates(&self) -> Result<PatternAggregates> {
        let table = self.patterns.read().await;
        let mut aggs = PatternAggregates {
            total_patterns: table.by_id.len() as u64,
            ..Default::default()
        };

        let mut confidence_sum = 0.0;
        let mut confidence_count = 0u64;

        for pattern in table.by_id.values() {
            if pattern.severity_level >= 4 {
                aggs.high_severity_patterns += 1;
            }
            *aggs
                .category_distribution
                .entry(pattern.category.to_string())
                .or_insert(0) += 1;
            if let Some(endpoint) = &pattern.api_endpoint {
                *aggs
                    .endpoint_distribution
                    .entry(endpoint.clone())
                    .or_insert(0) += pattern.occurrence_count;
            }
            if pattern.confidence_score > 0.0 {
                confidence_sum += pattern.confidence_score;
                confidence_count += 1;
            }
        }

        if confidence_count > 0 {
            aggs.average_confidence = round3(confidence_sum / confidence_count as f64);
        }

        Ok(aggs)
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn create(&self, entry: LearningHistoryEntry) -> Result<LearningHistoryEntry> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.id, entry.clone());
        Ok(entry)
    }

    async fn get_unanalyzed(&self, batch_size: usize) -> Result<Vec<LearningHistoryEntry>> {
        let entries = self.entries.read().await;
        let mut unanalyzed: Vec<LearningHistoryEntry> = entries
            .values()
            .filter(|e| !e.is_analyzed)
            .cloned()
            .collect();

        unanalyzed.sort_by_key(|e| (e.timestamp, e.id));
        unanalyzed.truncate(batch_size);
        Ok(unanalyzed)
    }

    async fn mark_analyzed(
        &self,
        ids: &[Uuid],
        contributed: bool,
        confidence: f64,
    ) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let mut updated = 0u64;

        for id in ids {
            if let Some(entry) = entries.get_mut(id) {
                entry.is_analyzed = true;
                entry.confidence_score = confidence;
                if contributed {
                    entry.contributed_to_pattern = true;
                }
                updated += 1;
            }
        }

        Ok(updated)
    }

    async fn get_by_pattern(
        &self,
        pattern_id: Uuid,
        limit: usize,
    ) -> Result<Vec<LearningHistoryEntry>> {
        let entries = self.entries.read().await;
        let mut matches: Vec<LearningHistoryEntry> = entries
            .values()
            .filter(|e| e.error_pattern_id == pattern_id)
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn aggregates(&self, window: &StatsWindow) -> Result<HistoryAggregates> {
        let entries = self.entries.read().await;
        let mut aggs = HistoryAggregates::default();

        let mut confidence_sum = 0.0;

        for entry in entries.values() {
            if !window.contains(entry.timestamp) {
                continue;
            }
            aggs.total_entries += 1;
            if entry.is_analyzed {
                aggs.analyzed_entries += 1;
            } else {
                aggs.unanalyzed_entries += 1;
            }
            if entry.contributed_to_pattern {
                aggs.contributed_entries += 1;
            }
            *aggs
                .source_distribution
                .entry(entry.source.clone())
                .or_insert(0) += 1;
            confidence_sum += entry.confidence_score;
        }

        if aggs.total_entries > 0 {
            aggs.average_confidence = round3(confidence_sum / aggs.total_entries as f64);
        }

        Ok(aggs)
    }
}

#[async_trait]
impl SuggestionStore for MemoryStore {
    async fn create_batch(
        &self,
        batch: Vec<OptimizationSuggestion>,
    ) -> Result<Vec<OptimizationSuggestion>> {
        let mut suggestions = self.suggestions.write().await;
        for suggestion in &batch {
            suggestions.insert(suggestion.id, suggestion.clone());
        }
        Ok(batch)
    }

    async fn query(&self, filter: &SuggestionFilter) -> Result<Vec<OptimizationSuggestion>> {
        let suggestions = self.suggestions.read().await;
        let mut matches: Vec<OptimizationSuggestion> = suggestions
            .values()
            .filter(|s| {
                filter
                    .suggestion_type
                    .map_or(true, |t| s.suggestion_type == t)
            })
            .filter(|s| filter.status.map_or(true, |st| s.status == st))
            .filter(|s| filter.min_priority.map_or(true, |p| s.priority >= p))
            .filter(|s| {
                filter
                    .min_confidence_score
                    .map_or(true, |c| s.confidence_score >= c)
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| {
            b.priority.cmp(&a.priority).then(
                b.confidence_score
                    .partial_cmp(&a.confidence_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });
        matches.truncate(filter.limit.unwrap_or(50));
        Ok(matches)
    }

    async fn get_by_pattern(&self, pattern_id: Uuid) -> Result<Vec<OptimizationSuggestion>> {
        let suggestions = self.suggestions.read().await;
        let mut matches: Vec<OptimizationSuggestion> = suggestions
            .values()
            .filter(|s| s.error_pattern_id == pattern_id)
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(matches)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: SuggestionStatus,
        reviewer_notes: Option<String>,
    ) -> Result<OptimizationSuggestion> {
        let mut suggestions = self.suggestions.write().await;
        let suggestion = suggestions
            .get_mut(&id)
            .ok_or(LearnError::SuggestionNotFound(id))?;

        suggestion.status = status;
        if let Some(notes) = reviewer_notes {
            suggestion.reviewer_notes = Some(notes);
        }
        if status != SuggestionStatus::Generated {
            suggestion.is_reviewed = true;
            suggestion.reviewed_at = Some(chrono::Utc::now());
        }

        Ok(suggestion.clone())
    }

    async fn aggregates(&self, window: &StatsWindow) -> Result<SuggestionAggregates> {
        let suggestions = self.suggestions.read().await;
        let mut aggs = SuggestionAggregates::default();

        for suggestion in suggestions.values() {
            if !window.contains(suggestion.generated_at) {
                continue;
            }
            aggs.total_suggestions += 1;
            if suggestion.is_pending() {
                aggs.pending_suggestions += 1;
            }
            match suggestion.status {
                SuggestionStatus::Approved => aggs.approved_suggestions += 1,
                SuggestionStatus::Implemented => aggs.implemented_suggestions += 1,
                SuggestionStatus::Rejected => aggs.rejected_suggestions += 1,
                _ => {}
            }
            *aggs
                .type_distribution
                .entry(suggestion.suggestion_type.to_string())
                .or_insert(0) += 1;
            *aggs
                .status_distribution
                .entry(suggestion.status.to_string())
                .or_insert(0) += 1;
        }

        Ok(aggs)
    }
}
