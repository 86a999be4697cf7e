//! Mutation frame - one activated set of catalog overrides

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::value_objects::{ImplementationPath, MutationName, OperationName, ServiceName};

/// An activated mutation for one service
///
/// Frames stack per service; only the topmost one takes part in resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationFrame {
    /// Service the frame belongs to
    pub service_name: ServiceName,
    /// Name of the activated mutation
    pub mutation_name: MutationName,
    /// Operation overrides; operations not listed fall through to the base catalog
    pub overrides: BTreeMap<OperationName, ImplementationPath>,
}

impl MutationFrame {
    /// Create a new frame
    pub const fn new(
        service_name: ServiceName,
        mutation_name: MutationName,
        overrides: BTreeMap<OperationName, ImplementationPath>,
    ) -> Self {
        Self {
            service_name,
            mutation_name,
            overrides,
        }
    }

    /// Override for an operation, if this frame redirects it
    pub fn override_for(&self, operation: &OperationName) -> Option<&ImplementationPath> {
        self.overrides.get(operation)
    }
}
