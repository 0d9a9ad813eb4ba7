//! Error types and result types for repository operations.
//!
//! Every fallible repository call returns [`ShelterResult<T>`]. Failures fall into
//! exactly two categories:
//!
//! - [`ShelterError::Validation`]: the caller passed arguments that violate the shape
//!   contract, such as a non-document query or an empty payload. These are raised
//!   before the backend is touched and are never retried.
//! - [`ShelterError::Operation`]: the backend reported a failure. The driver's message
//!   is carried through unchanged.
//!
//! Backends themselves report failures as [`BackendError`]; the repository tags them
//! with the [`Operation`] that was running.

use std::fmt;

use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// The repository operation that was running when a backend failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Connection setup and the liveness check.
    Connect,
    /// Single document insertion.
    Create,
    /// Multi-document read.
    Read,
    /// Single document read.
    ReadOne,
    /// Field-merge update.
    Update,
    /// Deletion.
    Delete,
    /// Document count.
    Count,
    /// Releasing the backend's connections.
    Shutdown,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Connect => "MongoDB connection",
            Operation::Create => "Create",
            Operation::Read => "Read",
            Operation::ReadOne => "Read one",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
            Operation::Count => "Count",
            Operation::Shutdown => "Shutdown",
        })
    }
}

/// Represents all errors surfaced by the repository.
#[derive(Error, Debug)]
pub enum ShelterError {
    /// Caller-supplied arguments violate the documented shape contract.
    #[error("{0}")]
    Validation(String),
    /// The underlying store reported a failure while running `operation`.
    #[error("{operation} failed: {message}")]
    Operation {
        /// The operation that was running.
        operation: Operation,
        /// The driver's failure message.
        message: String,
    },
}

impl ShelterError {
    /// Creates a validation error with the given message.
    pub fn validation(message: impl Into<String>) -> Self {
        ShelterError::Validation(message.into())
    }

    /// Creates an operation failure for `operation` carrying `source`'s message.
    pub fn operation(operation: Operation, source: impl fmt::Display) -> Self {
        ShelterError::Operation {
            operation,
            message: source.to_string(),
        }
    }

    /// Returns `true` if this error was raised by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, ShelterError::Validation(_))
    }

    /// Returns `true` if this error was reported by the underlying store.
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, ShelterError::Operation { .. })
    }

    /// Returns the failed operation, if this is an operation failure.
    pub fn failed_operation(&self) -> Option<Operation> {
        match self {
            ShelterError::Operation { operation, .. } => Some(*operation),
            ShelterError::Validation(_) => None,
        }
    }
}

/// A specialized `Result` type for repository operations.
pub type ShelterResult<T> = Result<T, ShelterError>;

impl From<SerdeJsonError> for ShelterError {
    fn from(err: SerdeJsonError) -> Self {
        ShelterError::Validation(format!("Invalid configuration: {err}"))
    }
}

/// A failure reported by a [`CollectionBackend`](crate::backend::CollectionBackend).
///
/// Carries the driver's message verbatim so it can be surfaced to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        BackendError(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Result type for backend calls.
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_failure_message() {
        let err = ShelterError::operation(Operation::Create, "duplicate key");
        assert_eq!(err.to_string(), "Create failed: duplicate key");
        assert!(err.is_operation_failure());
        assert!(!err.is_validation());
        assert_eq!(err.failed_operation(), Some(Operation::Create));
    }

    #[test]
    fn test_connection_failure_message() {
        let err = ShelterError::operation(Operation::Connect, BackendError::new("server selection timeout"));
        assert_eq!(err.to_string(), "MongoDB connection failed: server selection timeout");
    }

    #[test]
    fn test_shutdown_failure_message() {
        let err = ShelterError::operation(Operation::Shutdown, BackendError::new("connection reset"));
        assert_eq!(err.to_string(), "Shutdown failed: connection reset");
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = ShelterError::validation("Limit must be a positive integer.");
        assert_eq!(err.to_string(), "Limit must be a positive integer.");
        assert!(err.is_validation());
        assert_eq!(err.failed_operation(), None);
    }
}
