//! Error types for the vitals ingestion boundary
//!
//! Per-record problems are not errors here: a rejected record is a
//! [`DropReason`](crate::types::DropReason) value and the stream carries on.
//! The types below cover a line that cannot be decoded at all, and the
//! transport or configuration faults that legitimately stop a run.

use thiserror::Error;

/// A raw line could not be decoded into a record
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    #[error("Expected a JSON object at top level, found {0}")]
    NotAnObject(&'static str),

    #[error("Line is not valid UTF-8")]
    InvalidUtf8,
}

/// Errors that halt an ingestion run
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
