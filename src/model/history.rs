use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LearnError, Result};

/// One raw recorded failure occurrence
///
/// Created by the recorder with `is_analyzed = false`; flipped to analyzed
/// exactly once by the analyzer's batch update. Never deleted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningHistoryEntry {
    pub id: Uuid,
    pub error_pattern_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub test_case_name: Option<String>,
    pub api_name: Option<String>,
    pub error_message: String,
    pub request_details: Option<String>,
    pub response_details: Option<String>,
    pub stack_trace: Option<String>,
    pub environment_context: Option<String>,
    pub is_analyzed: bool,
    /// True when the recorder matched an existing pattern, or when the
    /// analyzer later folded this entry into a reinforced pattern
    pub contributed_to_pattern: bool,
    pub confidence_score: f64,
}

/// A failure reported by an external producer, before recording
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorReport {
    pub source: String,
    pub error_message: String,
    #[serde(default)]
    pub test_case_name: Option<String>,
    #[serde(default)]
    pub api_name: Option<String>,
    #[serde(default)]
    pub http_method: Option<String>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub http_status_code: Option<u16>,
    #[serde(default)]
    pub request_details: Option<String>,
    #[serde(default)]
    pub response_details: Option<String>,
    #[serde(default)]
    pub stack_trace: Option<String>,
    #[serde(default)]
    pub environment_context: Option<String>,
}

impl ErrorReport {
    /// Create a report with the two required fields
    pub fn new(source: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            error_message: error_message.into(),
            ..Default::default()
        }
    }

    pub fn with_test_case(mut self, name: impl Into<String>) -> Self {
        self.test_case_name = Some(name.into());
        self
    }

    pub fn with_api_name(mut self, name: impl Into<String>) -> Self {
        self.api_name = Some(name.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = Some(method.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.api_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_status(mut self, code: u16) -> Self {
        self.http_status_code = Some(code);
        self
    }

    pub fn with_request_details(mut self, details: impl Into<String>) -> Self {
        self.request_details = Some(details.into());
        self
    }

    pub fn with_response_details(mut self, details: impl Into<String>) -> Self {
        self.response_details = Some(details.into());
        self
    }

    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    pub fn with_environment(mut self, context: impl Into<String>) -> Self {
        self.environment_context = Some(context.into());
        self
    }

    /// Check the required fields; runs before any store access
    pub fn validate(&self) -> Result<()> {
        if self.source.trim().is_empty() {
            return Err(LearnError::Validation(
                "source cannot be empty".to_string(),
            ));
        }
        if self.error_message.trim().is_empty() {
            return Err(LearnError::Validation(
                "error message cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
