//! Error types and handling for the Arbor node-tree service.
//!
//! Store operations report failures through the single [`Error`] enum; the
//! request service is the only place where these are translated into the
//! closed wire-level error enumeration.

use thiserror::Error;

/// Main result type used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Arbor service
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Referenced entity (tenant, user, node, parent) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed or missing required field; the caller's fault, never retried
    #[error("Validation error: {0}")]
    Validation(String),

    /// Uniqueness violation (tenant name, tenant-scoped email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Storage layer errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal system errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage-specific errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing store refused the write transiently
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Corruption detected in stored data
    #[error("Data corruption detected: {0}")]
    Corruption(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error may succeed on retry.
    ///
    /// Validation, not-found and conflict outcomes are deterministic for a
    /// given input and must never be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Storage(StorageError::Unavailable(_)) | Error::Io(_)
        )
    }

    /// Check if this is a client error (4xx equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_) | Error::NotFound(_) | Error::Conflict(_)
        )
    }

    /// Check if this is a server error (5xx equivalent)
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_are_not_retryable() {
        for err in [
            Error::not_found("tenant"),
            Error::validation("name must not be empty"),
            Error::conflict("email already in use"),
        ] {
            assert!(err.is_client_error());
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_storage_unavailable_is_retryable() {
        let err = Error::Storage(StorageError::Unavailable("shard offline".into()));
        assert!(err.is_retryable());
        assert!(err.is_server_error());
    }
}
