//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Invalid service, operation or mutation identifier
    #[error("Invalid identifier '{value}': {reason}")]
    InvalidIdentifier { value: String, reason: String },

    /// Invalid dotted implementation path
    #[error("Invalid implementation path: {0}")]
    InvalidImplementationPath(String),

    /// Malformed error rule
    #[error("Invalid error rule for '{operation}': {reason}")]
    InvalidErrorRule { operation: String, reason: String },
}

impl DomainError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid error rule error
    pub fn invalid_rule(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidErrorRule {
            operation: operation.into(),
            reason: reason.into(),
        }
    }
}
