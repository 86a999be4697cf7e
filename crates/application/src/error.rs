//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Malformed catalog, mutation table or fault configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Service is not registered
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// Operation is neither in the catalog nor in the active mutation
    #[error("Unknown operation '{operation}' for service '{service}'")]
    UnknownOperation { service: String, operation: String },

    /// Mutation name is not defined for the service
    #[error("Unknown mutation '{mutation}' for service '{service}'")]
    UnknownMutation { service: String, mutation: String },

    /// Revert was called with an empty overlay stack
    #[error("No active mutation to revert for service '{0}'")]
    NoActiveMutation(String),

    /// Operation name appears twice in one table
    #[error("Duplicate operation '{operation}' for service '{service}'")]
    DuplicateOperation { service: String, operation: String },

    /// Catalog or mutation entry points at an unregistered implementation
    #[error("No implementation registered for '{0}'")]
    MissingImplementation(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Create an unknown operation error
    pub fn unknown_operation(service: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            service: service.into(),
            operation: operation.into(),
        }
    }

    /// Create an unknown mutation error
    pub fn unknown_mutation(service: impl Into<String>, mutation: impl Into<String>) -> Self {
        Self::UnknownMutation {
            service: service.into(),
            mutation: mutation.into(),
        }
    }

    /// Errors raised while loading or activating configuration
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::Domain(_)
                | Self::UnknownMutation { .. }
                | Self::DuplicateOperation { .. }
                | Self::MissingImplementation(_)
        )
    }

    /// Lookup failures for services or operations
    pub const fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownService(_) | Self::UnknownOperation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        assert!(ApplicationError::Configuration("bad".into()).is_configuration_error());
        assert!(ApplicationError::unknown_mutation("mail", "m9").is_configuration_error());
        assert!(ApplicationError::UnknownService("x".into()).is_resolution_error());
        assert!(ApplicationError::unknown_operation("mail", "x").is_resolution_error());

        let revert = ApplicationError::NoActiveMutation("mail".into());
        assert!(!revert.is_configuration_error());
        assert!(!revert.is_resolution_error());
    }

    #[test]
    fn messages_name_service_and_operation() {
        let err = ApplicationError::unknown_operation("calendar", "fly");
        assert_eq!(
            err.to_string(),
            "Unknown operation 'fly' for service 'calendar'"
        );
    }
}
