//! Error types for shelfsync
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for shelfsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for shelfsync
#[derive(Error, Debug)]
pub enum Error {
    /// Record store errors (backend reported a failure)
    #[error("Record store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (file-backed stores)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A remote record could not be mapped to an entity
    #[error("Mapping error ({table}): {message}")]
    Mapping {
        /// Remote table name
        table: String,
        /// What went wrong
        message: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Conflicting concurrent write reported by the backend
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Invalid input (caller contract violated)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Operation not supported by this record store
    #[error("Unsupported operation ({store}): {operation}")]
    Unsupported {
        /// Store name
        store: String,
        /// Operation name
        operation: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a record store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a mapping error for a table
    pub fn mapping(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an unsupported-operation error
    pub fn unsupported(store: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Unsupported {
            store: store.into(),
            operation: operation.into(),
        }
    }

    /// Whether this error is a caller-side rejection rather than a store failure
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_is_only_invalid_input() {
        assert!(Error::invalid_input("title is required").is_rejection());
        assert!(!Error::store("connection reset").is_rejection());
        assert!(!Error::not_found("livros/7").is_rejection());
    }

    #[test]
    fn anyhow_errors_keep_their_message() {
        let err: Error = anyhow::anyhow!("backend went away").into();
        assert_eq!(err.to_string(), "backend went away");
    }
}
