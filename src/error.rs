//! Error types for Safeguard Assess
//!
//! User input (answers, incidents, severities) never produces an error. These
//! variants cover configuration loading, state persistence and FFI parsing.

use thiserror::Error;

/// Errors that can occur outside the permissive assessment operations
#[derive(Debug, Error)]
pub enum AssessmentError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid scoring config: {0}")]
    InvalidConfig(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Storage error: {0}")]
    Storage(String),
}
