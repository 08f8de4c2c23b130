//! Error types for the errlearn engine
//!
//! Provides a single crate-wide error enum with context propagation
//! from the store layer up through the learning services.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for the error learning engine
#[derive(Error, Debug)]
pub enum LearnError {
    /// Invalid recording input, raised before any store access
    #[error("Validation error: {0}")]
    Validation(String),

    /// Pattern lookup by id failed where the caller required one
    #[error("Error pattern not found: {0}")]
    PatternNotFound(Uuid),

    /// Suggestion lookup by id failed where the caller required one
    #[error("Optimization suggestion not found: {0}")]
    SuggestionNotFound(Uuid),

    /// Attempt to create a second pattern with an existing fingerprint
    #[error("Duplicate pattern hash: {0}")]
    DuplicateHash(String),

    /// Store-layer failures that do not map to a more specific variant
    #[error("Store error: {0}")]
    Store(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for learning operations
pub type Result<T> = std::result::Result<T, LearnError>;
