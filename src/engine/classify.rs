//! Rule-based failure classification
//!
//! An ordered table of classification rules evaluated top-to-bottom: the
//! HTTP status table first, then keyword rules over the normalized message,
//! then the General/Unknown fallback. New rules extend the table without
//! touching existing ones.

use crate::model::{Category, Subcategory};

/// Result of classifying one failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub category: Category,
    pub subcategory: Subcategory,
}

struct Rule {
    applies: fn(&str, Option<u16>) -> bool,
    category: Category,
    subcategory: Subcategory,
}

const RULES: &[Rule] = &[
    // HTTP status table
    Rule {
        applies: |_, status| status == Some(400),
        category: Category::Http,
        subcategory: Subcategory::BadRequest,
    },
    Rule {
        applies: |_, status| status == Some(401),
        category: Category::Http,
        subcategory: Subcategory::Unauthorized,
    },
    Rule {
        applies: |_, status| status == Some(403),
        category: Category::Http,
        subcategory: Subcategory::Forbidden,
    },
    Rule {
        applies: |_, status| status == Some(404),
        category: Category::Http,
        subcategory: Subcategory::NotFound,
    },
    Rule {
        applies: |_, status| status == Some(429),
        category: Category::Http,
        subcategory: Subcategory::RateLimited,
    },
    Rule {
        applies: |_, status| status == Some(500),
        category: Category::Http,
        subcategory: Subcategory::InternalServerError,
    },
    Rule {
        applies: |_, status| status == Some(502),
        category: Category::Http,
        subcategory: Subcategory::BadGateway,
    },
    Rule {
        applies: |_, status| status == Some(503),
        category: Category::Http,
        subcategory: Subcategory::ServiceUnavailable,
    },
    // Any other status still classifies as HTTP
    Rule {
        applies: |_, status| status.is_some(),
        category: Category::Http,
        subcategory: Subcategory::Unknown,
    },
    // Keyword rules over the normalized message
    Rule {
        applies: |message, _| message.contains("timeout"),
        category: Category::Network,
        subcategory: Subcategory::Timeout,
    },
    Rule {
        applies: |message, _| {
            message.contains("connection")
                && (message.contains("refused") || message.contains("failed"))
        },
        category: Category::Network,
        subcategory: Subcategory::ConnectionFailure,
    },
    Rule {
        applies: |message, _| {
            message.contains("authentication") || message.contains("unauthorized")
        },
        category: Category::Security,
        subcategory: Subcategory::Authentication,
    },
    Rule {
        applies: |message, _| {
            message.contains("permission") || message.contains("access denied")
        },
        category: Category::Security,
        subcategory: Subcategory::Authorization,
    },
    Rule {
        applies: |message, _| message.contains("parse") || message.contains("format"),
        category: Category::Data,
        subcategory: Subcategory::ParseError,
    },
    Rule {
        applies: |message, _| message.contains("validation") || message.contains("invalid"),
        category: Category::Data,
        subcategory: Subcategory::ValidationError,
    },
];

/// Classify a failure from its normalized message and optional status code
///
/// Pure function of its inputs; falls back to General/Unknown when no rule
/// matches.
pub fn classify(normalized_message: &str, http_status_code: Option<u16>) -> Classification {
    for rule in RULES {
        if (rule.applies)(normalized_message, http_status_code) {
            return Classification {
                category: rule.category,
                subcategory: rule.subcategory,
            };
        }
    }

    Classification {
        category: Category::General,
        subcategory: Subcategory::Unknown,
    }
}

/// Severity from 1 (minimal) to 5 (critical); pure function of its inputs
pub fn severity(normalized_message: &str, http_status_code: Option<u16>) -> u8 {
    let message = normalized_message;

    if http_status_code.map_or(false, |s| s >= 500)
        || message.contains("critical")
        || message.contains("fatal")
    {
        return 5;
    }

    if http_status_code == Some(429)
        || message.contains("timeout")
        || message.contains("connection")
    {
        return 4;
    }

    if matches!(http_status_code, Some(401) | Some(403))
        || message.contains("unauthorized")
        || message.contains("forbidden")
    {
        return 3;
    }

    if matches!(http_status_code, Some(400) | Some(404))
        || message.contains("validation")
        || message.contains("not found")
    {
        return 2;
    }

    1
}

/// Maximum description length before truncation
const DESCRIPTION_LIMIT: usize = 100;

/// Human-readable pattern description from the normalized message
pub fn describe(
    normalized_message: &str,
    api_endpoint: Option<&str>,
    http_method: Option<&str>,
) -> String {
    let truncated = if normalized_message.chars().count() > DESCRIPTION_LIMIT {
        let head: String = normalized_message.chars().take(DESCRIPTION_LIMIT - 3).collect();
        format!("{}...", head)
    } else {
        normalized_message.to_string()
    };

    match api_endpoint {
        Some(endpoint) if !endpoint.is_empty() => {
            format!("{} {}: {}", http_method.unwrap_or("HTTP"), endpoint, truncated)
        }
        _ => truncated,
    }
}
