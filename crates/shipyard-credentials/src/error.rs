//! Error types for shipyard-credentials

use thiserror::Error;

/// Errors that can occur while looking up or loading credentials
#[derive(Error, Debug)]
pub enum CredentialError {
    /// The backing secret store could not be queried
    #[error("credential backend unavailable: {0}")]
    Backend(String),

    /// A stored entry exists but cannot be turned into credentials
    #[error("malformed credential entry for {key}: {reason}")]
    Malformed { key: String, reason: String },

    /// Unknown credential type string
    #[error("unknown credential type: {0}")]
    UnknownType(String),

    /// IO error while reading a credentials file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for credential operations
pub type CredentialResult<T> = std::result::Result<T, CredentialError>;
