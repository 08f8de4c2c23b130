use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Kind of optimization a suggestion proposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptimizationType {
    TestCaseOptimization,
    ErrorHandlingImprovement,
    PerformanceOptimization,
    TimeoutOptimization,
    AssertionImprovement,
    ArchitecturalImprovement,
    CodeQualityImprovement,
}

impl OptimizationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimizationType::TestCaseOptimization => "TestCaseOptimization",
            OptimizationType::ErrorHandlingImprovement => "ErrorHandlingImprovement",
            OptimizationType::PerformanceOptimization => "PerformanceOptimization",
            OptimizationType::TimeoutOptimization => "TimeoutOptimization",
            OptimizationType::AssertionImprovement => "AssertionImprovement",
            OptimizationType::ArchitecturalImprovement => "ArchitecturalImprovement",
            OptimizationType::CodeQualityImprovement => "CodeQualityImprovement",
        }
    }

    /// Baseline effort estimate per suggestion kind, in hours
    pub fn default_effort_hours(&self) -> f64 {
        match self {
            OptimizationType::TestCaseOptimization => 4.0,
            OptimizationType::ErrorHandlingImprovement => 8.0,
            OptimizationType::PerformanceOptimization => 16.0,
            OptimizationType::TimeoutOptimization => 2.0,
            OptimizationType::AssertionImprovement => 3.0,
            OptimizationType::ArchitecturalImprovement => 24.0,
            OptimizationType::CodeQualityImprovement => 6.0,
        }
    }
}

impl fmt::Display for OptimizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OptimizationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testcaseoptimization" | "test-case" => Ok(OptimizationType::TestCaseOptimization),
            "errorhandlingimprovement" | "error-handling" => {
                Ok(OptimizationType::ErrorHandlingImprovement)
            }
            "performanceoptimization" | "performance" => {
                Ok(OptimizationType::PerformanceOptimization)
            }
            "timeoutoptimization" | "timeout" => Ok(OptimizationType::TimeoutOptimization),
            "assertionimprovement" | "assertion" => Ok(OptimizationType::AssertionImprovement),
            "architecturalimprovement" | "architecture" => {
                Ok(OptimizationType::ArchitecturalImprovement)
            }
            "codequalityimprovement" | "code-quality" => {
                Ok(OptimizationType::CodeQualityImprovement)
            }
            other => Err(format!("unknown optimization type: {}", other)),
        }
    }
}

/// Review lifecycle state of a suggestion
///
/// Any status is reachable from any other through the update operation;
/// the engine enforces no transition graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuggestionStatus {
    Generated,
    Reviewed,
    Approved,
    Rejected,
    Implemented,
}

impl SuggestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStatus::Generated => "Generated",
            SuggestionStatus::Reviewed => "Reviewed",
            SuggestionStatus::Approved => "Approved",
            SuggestionStatus::Rejected => "Rejected",
            SuggestionStatus::Implemented => "Implemented",
        }
    }
}

impl fmt::Display for SuggestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SuggestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "generated" => Ok(SuggestionStatus::Generated),
            "reviewed" => Ok(SuggestionStatus::Reviewed),
            "approved" => Ok(SuggestionStatus::Approved),
            "rejected" => Ok(SuggestionStatus::Rejected),
            "implemented" => Ok(SuggestionStatus::Implemented),
            other => Err(format!("unknown suggestion status: {}", other)),
        }
    }
}

/// A generated, reviewable recommendation tied to an error pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationSuggestion {
    pub id: Uuid,
    pub error_pattern_id: Uuid,
    pub suggestion_type: OptimizationType,
    /// 1 (low) to 5 (urgent)
    pub priority: u8,
    pub title: String,
    pub description: String,
    pub target_component: Option<String>,
    pub expected_impact: Option<String>,
    pub estimated_effort_hours: Option<f64>,
    pub confidence_score: f64,
    pub generated_at: DateTime<Utc>,
    pub status: SuggestionStatus,
    pub implementation_details: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub is_reviewed: bool,
    pub reviewer_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl OptimizationSuggestion {
    /// Fresh suggestion in the initial lifecycle state
    pub fn new(
        error_pattern_id: Uuid,
        suggestion_type: OptimizationType,
        title: impl Into<String>,
        description: impl Into<String>,
        priority: u8,
        confidence_score: f64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            error_pattern_id,
            suggestion_type,
            priority,
            title: title.into(),
            description: description.into(),
            target_component: None,
            expected_impact: None,
            estimated_effort_hours: Some(suggestion_type.default_effort_hours()),
            confidence_score,
            generated_at: Utc::now(),
            status: SuggestionStatus::Generated,
            implementation_details: None,
            tags: Vec::new(),
            is_reviewed: false,
            reviewer_notes: None,
            reviewed_at: None,
        }
    }

    pub fn with_target_component(mut self, component: impl Into<String>) -> Self {
        self.target_component = Some(component.into());
        self
    }

    pub fn with_expected_impact(mut self, impact: impl Into<String>) -> Self {
        self.expected_impact = Some(impact.into());
        self
    }

    pub fn with_implementation_details(mut self, details: impl Into<String>) -> Self {
        self.implementation_details = Some(details.into());
        self
    }

    /// Whether this suggestion still awaits a review decision
    pub fn is_pending(&self) -> bool {
        matches!(
            self.status,
            SuggestionStatus::Generated | SuggestionStatus::Reviewed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_suggestion_starts_generated() {
        let suggestion = OptimizationSuggestion::new(
            Uuid::new_v4(),
            OptimizationType::ErrorHandlingImprovement,
            "Implement retry logic with exponential backoff",
            "API endpoint frequently returns 429",
            4,
            0.6,
        );

        assert_eq!(suggestion.status, SuggestionStatus::Generated);
        assert!(!suggestion.is_reviewed);
        assert!(suggestion.reviewed_at.is_none());
        assert_eq!(suggestion.estimated_effort_hours, Some(8.0));
    }

    #[test]
    fn test_is_pending() {
        let mut suggestion = OptimizationSuggestion::new(
            Uuid::new_v4(),
            OptimizationType::TestCaseOptimization,
            "t",
            "d",
            2,
            0.5,
        );
        assert!(suggestion.is_pending());

        suggestion.status = SuggestionStatus::Implemented;
        assert!(!suggestion.is_pending());
    }

    #[test]
    fn test_type_parse_aliases() {
        assert_eq!(
            "error-handling".parse::<OptimizationType>().unwrap(),
            OptimizationType::ErrorHandlingImprovement
        );
        assert_eq!(
            "PerformanceOptimization".parse::<OptimizationType>().unwrap(),
            OptimizationType::PerformanceOptimization
        );
        assert!("bogus".parse::<OptimizationType>().is_err());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(
            "approved".parse::<SuggestionStatus>().unwrap(),
            SuggestionStatus::Approved
        );
        assert!("done".parse::<SuggestionStatus>().is_err());
    }

    #[test]
    fn test_effort_hours_table() {
        assert_eq!(OptimizationType::TimeoutOptimization.default_effort_hours(), 2.0);
        assert_eq!(
            OptimizationType::ArchitecturalImprovement.default_effort_hours(),
            24.0
        );
    }
}
