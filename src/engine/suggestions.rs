//! Optimization suggestion generation and lifecycle
//!
//! A registry of independent heuristic rules, each mapping one pattern to
//! at most one suggestion. New heuristics are appended to the registry
//! without touching existing ones.

use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::errors::Result;
use crate::model::{
    Category, ErrorPattern, OptimizationSuggestion, OptimizationType, Subcategory,
    SuggestionStatus,
};
use crate::store::{PatternStore, SuggestionFilter, SuggestionStore};

/// One heuristic: pattern in, suggestion out (or nothing)
type SuggestionRule = fn(&ErrorPattern) -> Option<OptimizationSuggestion>;

/// Occurrence count beyond which repeated General failures hint at test
/// isolation problems
const ISOLATION_OCCURRENCE_FLOOR: u64 = 10;

const RULES: &[SuggestionRule] = &[
    longer_test_timeout,
    parallel_isolation_review,
    retry_with_backoff,
    circuit_breaker,
    connection_timeout_tuning,
    validation_assertions,
];

/// Network/Timeout patterns: tests need a longer timeout
fn longer_test_timeout(pattern: &ErrorPattern) -> Option<OptimizationSuggestion> {
    if pattern.category != Category::Network || pattern.subcategory != Subcategory::Timeout {
        return None;
    }

    let endpoint = pattern.component_label("Network Operations");
    Some(
        OptimizationSuggestion::new(
            pattern.id,
            OptimizationType::TestCaseOptimization,
            "Increase test timeout for network operations",
            format!(
                "Tests for {} are timing out frequently. Consider increasing timeout from default to account for network latency.",
                endpoint
            ),
            pattern.severity_level,
            (pattern.confidence_score + 0.1).min(0.9),
        )
        .with_target_component(endpoint)
        .with_expected_impact("Reduced test flakiness due to timeouts")
        .with_implementation_details(
            "Update test configuration to use longer timeout values for network-dependent operations",
        ),
    )
}

/// Frequent General failures: likely test isolation issues under parallelism
fn parallel_isolation_review(pattern: &ErrorPattern) -> Option<OptimizationSuggestion> {
    if pattern.occurrence_count <= ISOLATION_OCCURRENCE_FLOOR
        || pattern.category != Category::General
    {
        return None;
    }

    Some(
        OptimizationSuggestion::new(
            pattern.id,
            OptimizationType::TestCaseOptimization,
            "Review test isolation for parallel execution",
            "Frequent errors may indicate test isolation issues when running in parallel.",
            3,
            pattern.confidence_score * 0.8,
        )
        .with_target_component(pattern.component_label("Test Framework"))
        .with_expected_impact("Improved test reliability in parallel execution")
        .with_implementation_details(
            "Review shared state, static variables, and resource contention",
        ),
    )
}

/// HTTP 429: retry with exponential backoff
fn retry_with_backoff(pattern: &ErrorPattern) -> Option<OptimizationSuggestion> {
    if pattern.category != Category::Http || pattern.http_status_code != Some(429) {
        return None;
    }

    let endpoint = pattern.component_label("HTTP Client");
    Some(
        OptimizationSuggestion::new(
            pattern.id,
            OptimizationType::ErrorHandlingImprovement,
            "Implement retry logic with exponential backoff",
            format!(
                "API endpoint {} frequently returns 429 (Too Many Requests). Implement proper retry mechanism.",
                endpoint
            ),
            4,
            (pattern.confidence_score + 0.2).min(0.95),
        )
        .with_target_component(endpoint)
        .with_expected_impact("Reduced rate limit errors through intelligent retry")
        .with_implementation_details(
            "Use exponential backoff with jitter, respect Retry-After headers",
        ),
    )
}

/// HTTP 5xx: shield the caller with a circuit breaker
fn circuit_breaker(pattern: &ErrorPattern) -> Option<OptimizationSuggestion> {
    if pattern.category != Category::Http || !pattern.is_server_error() {
        return None;
    }

    let endpoint = pattern.component_label("API Client");
    Some(
        OptimizationSuggestion::new(
            pattern.id,
            OptimizationType::ErrorHandlingImprovement,
            "Add circuit breaker pattern for server errors",
            format!(
                "Frequent server errors (5xx) from {}. Consider implementing circuit breaker pattern.",
                endpoint
            ),
            pattern.severity_level,
            pattern.confidence_score,
        )
        .with_target_component(endpoint)
        .with_expected_impact("Prevent cascade failures during service outages")
        .with_implementation_details(
            "Implement circuit breaker with configurable failure threshold and timeout",
        ),
    )
}

/// Network/Timeout patterns: connection timeout configuration needs tuning
fn connection_timeout_tuning(pattern: &ErrorPattern) -> Option<OptimizationSuggestion> {
    if pattern.category != Category::Network || pattern.subcategory != Subcategory::Timeout {
        return None;
    }

    let endpoint = pattern.component_label("Network Configuration");
    Some(
        OptimizationSuggestion::new(
            pattern.id,
            OptimizationType::PerformanceOptimization,
            "Optimize connection timeout settings",
            format!(
                "Connection timeouts detected for {}. Review and optimize timeout configurations.",
                endpoint
            ),
            (pattern.severity_level + 1).min(5),
            pattern.confidence_score,
        )
        .with_target_component(endpoint)
        .with_expected_impact("Improved reliability and user experience")
        .with_implementation_details(
            "Configure appropriate connection and read timeout values based on API characteristics",
        ),
    )
}

/// Data/ValidationError patterns: assertions are too loose
fn validation_assertions(pattern: &ErrorPattern) -> Option<OptimizationSuggestion> {
    if pattern.category != Category::Data || pattern.subcategory != Subcategory::ValidationError {
        return None;
    }

    Some(
        OptimizationSuggestion::new(
            pattern.id,
            OptimizationType::TestCaseOptimization,
            "Improve test data validation assertions",
            "Validation errors suggest assertions could be more specific about expected data formats.",
            2,
            pattern.confidence_score * 0.7,
        )
        .with_target_component("Test Assertions")
        .with_expected_impact("Clearer test failures with more specific error messages")
        .with_implementation_details(
            "Add specific assertions for data format, range, and business rule validation",
        ),
    )
}

/// Generates suggestions for patterns and manages their review lifecycle
pub struct SuggestionGenerator {
    patterns: Arc<dyn PatternStore>,
    suggestions: Arc<dyn SuggestionStore>,
}

impl SuggestionGenerator {
    pub fn new(patterns: Arc<dyn PatternStore>, suggestions: Arc<dyn SuggestionStore>) -> Self {
        Self {
            patterns,
            suggestions,
        }
    }

    /// Run every registered heuristic against one pattern
    ///
    /// An unknown pattern id is a soft failure: logged, empty result, no
    /// error, so batch callers can continue past missing data. Drafted
    /// suggestions are persisted as one batch and the stored copies
    /// returned.
    pub async fn generate_for_pattern(
        &self,
        pattern_id: Uuid,
    ) -> Result<Vec<OptimizationSuggestion>> {
        let result = self.generate_inner(pattern_id).await;
        if let Err(err) = &result {
            error!(%pattern_id, error = %err, "suggestion generation failed");
        }
        result
    }

    async fn generate_inner(&self, pattern_id: Uuid) -> Result<Vec<OptimizationSuggestion>> {
        let pattern = match self.patterns.get_by_id(pattern_id).await? {
            Some(pattern) => pattern,
            None => {
                warn!(%pattern_id, "pattern not found; no suggestions generated");
                return Ok(Vec::new());
            }
        };

        let drafted: Vec<OptimizationSuggestion> =
            RULES.iter().filter_map(|rule| rule(&pattern)).collect();

        if drafted.is_empty() {
            debug!(%pattern_id, "no heuristic matched pattern");
            return Ok(Vec::new());
        }

        let saved = self.suggestions.create_batch(drafted).await?;
        info!(
            %pattern_id,
            count = saved.len(),
            "generated optimization suggestions"
        );

        Ok(saved)
    }

    /// Filtered retrieval; filters are AND-combined
    pub async fn query(&self, filter: &SuggestionFilter) -> Result<Vec<OptimizationSuggestion>> {
        self.suggestions.query(filter).await
    }

    /// Suggestions generated for one pattern, newest first
    pub async fn for_pattern(&self, pattern_id: Uuid) -> Result<Vec<OptimizationSuggestion>> {
        self.suggestions.get_by_pattern(pattern_id).await
    }

    /// Set the review status of one suggestion; no transition graph is
    /// enforced, any status is reachable from any other
    pub async fn update_status(
        &self,
        suggestion_id: Uuid,
        status: SuggestionStatus,
        reviewer_notes: Option<String>,
    ) -> Result<OptimizationSuggestion> {
        let result = self
            .suggestions
            .update_status(suggestion_id, status, reviewer_notes)
            .await;

        match &result {
            Ok(updated) => {
                info!(%suggestion_id, status = %updated.status, "suggestion status updated")
            }
            Err(err) => error!(%suggestion_id, error = %err, "suggestion status update failed"),
        }
        result
    }
}
