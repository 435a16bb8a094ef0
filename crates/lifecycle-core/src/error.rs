//! Error types for the document lifecycle core

use thiserror::Error;

/// Main error type for all lifecycle operations
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Workflow not actionable: {0}")]
    InvalidState(String),

    #[error("Stale step reference: workflow is at step {expected}, action targeted step {submitted}")]
    StepMismatch { expected: u32, submitted: u32 },

    #[error("Network error: {0}")]
    Network(String),
}

/// Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;
