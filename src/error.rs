//! Error types for event-matrix

use thiserror::Error;

/// Errors that can occur while building an event matrix
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to parse event log: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Malformed record at index {index}: missing `{field}`")]
    MalformedRecord { index: usize, field: &'static str },

    #[error("Unknown event column: {0}")]
    UnknownEvent(String),

    #[error("Unknown user row: {0}")]
    UnknownUser(String),
}
