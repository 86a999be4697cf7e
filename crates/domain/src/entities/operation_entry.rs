//! Operation catalog entry

use serde::{Deserialize, Serialize};

use crate::value_objects::{ImplementationPath, OperationName};

/// Maps one public operation name to its implementation reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationEntry {
    /// Public operation name, unique within its service
    pub operation_name: OperationName,
    /// Registry key of the implementation
    pub implementation_path: ImplementationPath,
}

impl OperationEntry {
    /// Create a new entry
    pub const fn new(operation_name: OperationName, implementation_path: ImplementationPath) -> Self {
        Self {
            operation_name,
            implementation_path,
        }
    }

    /// Parse an entry from raw strings
    pub fn parse(operation_name: &str, implementation_path: &str) -> Result<Self, crate::DomainError> {
        Ok(Self::new(
            OperationName::new(operation_name)?,
            ImplementationPath::new(implementation_path)?,
        ))
    }
}
