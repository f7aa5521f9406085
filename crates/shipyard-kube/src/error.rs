//! Error types for shipyard-kube

use thiserror::Error;

/// Errors that can occur while sending a request through the transport chain
#[derive(Error, Debug)]
pub enum TransportError {
    /// The request body is a stream and cannot be cloned
    #[error("request to {url} cannot be cloned (streaming body)")]
    RequestNotCloneable { url: String },

    /// A credential could not be encoded as a header value
    #[error("invalid credential header for request to {url}")]
    InvalidCredential { url: String },

    /// An API path did not form a valid URL against the configured server
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Client construction error
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::Http(err.to_string())
    }
}

/// Result type for transport operations
pub type TransportResult<T> = std::result::Result<T, TransportError>;
