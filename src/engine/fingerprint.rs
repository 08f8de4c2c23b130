//! Message normalization and pattern fingerprinting
//!
//! Occurrences that differ only in variable data (timestamps, guids, ids)
//! must canonicalize to the same text so they fold into one pattern.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Fingerprint length kept from the digest; short enough to read in logs
/// and reports, long enough that collisions stay an accepted trade-off
const FINGERPRINT_LEN: usize = 16;

static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}t\d{2}:\d{2}:\d{2}").unwrap()
});

static GUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}\b").unwrap()
});

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d+\b").unwrap());

/// Canonicalize an error message for matching
///
/// Lowercases, then replaces ISO-8601-like timestamps, UUID-shaped tokens
/// and bare integers with fixed placeholders. Replacement order matters:
/// timestamps and guids are swallowed before the bare-number pass.
pub fn normalize_message(error_message: &str) -> String {
    let normalized = error_message.to_lowercase();
    let normalized = TIMESTAMP_RE.replace_all(&normalized, "[timestamp]");
    let normalized = GUID_RE.replace_all(&normalized, "[guid]");
    let normalized = NUMBER_RE.replace_all(&normalized, "[number]");
    normalized.into_owned()
}

/// Deterministic fingerprint over the normalized message and request shape
///
/// First 16 base64 characters of SHA-256 over
/// `normalized|endpoint|method|status`.
pub fn pattern_fingerprint(
    error_message: &str,
    api_endpoint: Option<&str>,
    http_method: Option<&str>,
    http_status_code: Option<u16>,
) -> String {
    let normalized = normalize_message(error_message);
    fingerprint_normalized(&normalized, api_endpoint, http_method, http_status_code)
}

/// Fingerprint a message that has already been normalized
pub fn fingerprint_normalized(
    normalized_message: &str,
    api_endpoint: Option<&str>,
    http_method: Option<&str>,
    http_status_code: Option<u16>,
) -> String {
    let status = http_status_code.map(|c| c.to_string()).unwrap_or_default();
    let input = format!(
        "{}|{}|{}|{}",
        normalized_message,
        api_endpoint.unwrap_or(""),
        http_method.unwrap_or(""),
        status
    );

    let digest = Sha256::digest(input.as_bytes());
    let encoded = BASE64.encode(digest);
    encoded[..FINGERPRINT_LEN].to_string()
}
