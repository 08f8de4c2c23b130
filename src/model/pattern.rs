use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Top-level error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "HTTP")]
    Http,
    Network,
    Security,
    Data,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Http => "HTTP",
            Category::Network => "Network",
            Category::Security => "Security",
            Category::Data => "Data",
            Category::General => "General",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Category::Http),
            "network" => Ok(Category::Network),
            "security" => Ok(Category::Security),
            "data" => Ok(Category::Data),
            "general" => Ok(Category::General),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

/// Fine-grained classification within a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subcategory {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    RateLimited,
    InternalServerError,
    BadGateway,
    ServiceUnavailable,
    Timeout,
    ConnectionFailure,
    Authentication,
    Authorization,
    ParseError,
    ValidationError,
    Unknown,
}

impl Subcategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subcategory::BadRequest => "BadRequest",
            Subcategory::Unauthorized => "Unauthorized",
            Subcategory::Forbidden => "Forbidden",
            Subcategory::NotFound => "NotFound",
            Subcategory::RateLimited => "RateLimited",
            Subcategory::InternalServerError => "InternalServerError",
            Subcategory::BadGateway => "BadGateway",
            Subcategory::ServiceUnavailable => "ServiceUnavailable",
            Subcategory::Timeout => "Timeout",
            Subcategory::ConnectionFailure => "ConnectionFailure",
            Subcategory::Authentication => "Authentication",
            Subcategory::Authorization => "Authorization",
            Subcategory::ParseError => "ParseError",
            Subcategory::ValidationError => "ValidationError",
            Subcategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Subcategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deduplicated, classified signature for one recurring kind of failure
///
/// Created by the recorder on the first occurrence of a new fingerprint,
/// reinforced on repeats; never deleted by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub id: Uuid,
    /// Fingerprint of the normalized error content; unique per store
    pub pattern_hash: String,
    pub category: Category,
    pub subcategory: Subcategory,
    pub description: String,
    pub http_status_code: Option<u16>,
    pub api_endpoint: Option<String>,
    pub http_method: Option<String>,
    /// Times this pattern has been observed; monotonically non-decreasing
    pub occurrence_count: u64,
    pub first_observed: DateTime<Utc>,
    pub last_observed: DateTime<Utc>,
    /// 1 (low) to 5 (critical)
    pub severity_level: u8,
    /// Heuristic certainty, never above 0.95
    pub confidence_score: f64,
    pub context: Option<String>,
    pub suggested_solutions: Option<String>,
}

impl ErrorPattern {
    /// Whether this pattern carries a server-side HTTP status
    pub fn is_server_error(&self) -> bool {
        self.http_status_code.map_or(false, |code| code >= 500)
    }

    /// Target component label used when generating suggestions
    pub fn component_label(&self, fallback: &str) -> String {
        self.api_endpoint
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pattern(status: Option<u16>) -> ErrorPattern {
        ErrorPattern {
            id: Uuid::new_v4(),
            pattern_hash: "hash0123456789ab".to_string(),
            category: Category::Http,
            subcategory: Subcategory::Unknown,
            description: "GET /v1/items: something failed".to_string(),
            http_status_code: status,
            api_endpoint: Some("/v1/items".to_string()),
            http_method: Some("GET".to_string()),
            occurrence_count: 1,
            first_observed: Utc::now(),
            last_observed: Utc::now(),
            severity_level: 2,
            confidence_score: 0.4,
            context: None,
            suggested_solutions: None,
        }
    }

    #[test]
    fn test_category_display() {
        assert_eq!(Category::Http.to_string(), "HTTP");
        assert_eq!(Category::Network.to_string(), "Network");
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("http".parse::<Category>().unwrap(), Category::Http);
        assert_eq!("Network".parse::<Category>().unwrap(), Category::Network);
        assert!("bogus".parse::<Category>().is_err());
    }

    #[test]
    fn test_is_server_error() {
        assert!(sample_pattern(Some(503)).is_server_error());
        assert!(!sample_pattern(Some(404)).is_server_error());
        assert!(!sample_pattern(None).is_server_error());
    }

    #[test]
    fn test_component_label_prefers_endpoint() {
        let pattern = sample_pattern(None);
        assert_eq!(pattern.component_label("HTTP Client"), "/v1/items");

        let mut no_endpoint = sample_pattern(None);
        no_endpoint.api_endpoint = None;
        assert_eq!(no_endpoint.component_label("HTTP Client"), "HTTP Client");
    }

    #[test]
    fn test_category_serializes_as_http() {
        let json = serde_json::to_string(&Category::Http).unwrap();
        assert_eq!(json, "\"HTTP\"");
    }
}
