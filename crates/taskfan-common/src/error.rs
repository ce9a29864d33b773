//! Error types for the task wire model

use thiserror::Error;

/// Result type alias for wire-level operations
pub type Result<T> = std::result::Result<T, WireError>;

/// Errors raised while encoding or decoding task requests
#[derive(Error, Debug)]
pub enum WireError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
