//! Service module port
//!
//! A service module is one simulated third-party API. It contributes its
//! operation table, its mutation tables and the implementations behind
//! both, and owns an in-memory fixture store the harness never looks into.

use std::path::Path;

use domain::{OperationEntry, ServiceName};
#[cfg(test)]
use mockall::automock;
use serde_json::Value;

use crate::error::ApplicationError;
use crate::services::{ImplementationRegistry, MutationDefinition};

/// Port implemented by every simulated service
#[cfg_attr(test, automock)]
pub trait ServiceModule: Send + Sync {
    /// Service name used as the overlay and fault-injection key
    fn name(&self) -> ServiceName;

    /// Static operation table (base catalog)
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an entry is malformed.
    fn operations(&self) -> Result<Vec<OperationEntry>, ApplicationError>;

    /// Named alternate implementation sets
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a mutation name or override entry
    /// is malformed.
    fn mutations(&self) -> Result<Vec<MutationDefinition>, ApplicationError>;

    /// Register every implementation referenced by the tables above
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a path is registered twice.
    fn register(&self, registry: &mut ImplementationRegistry) -> Result<(), ApplicationError>;

    /// Replace the fixture store with the contents of a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load_state(&self, path: &Path) -> Result<(), ApplicationError>;

    /// Write the fixture store to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save_state(&self, path: &Path) -> Result<(), ApplicationError>;

    /// Compact, agent-visible snapshot of the store
    fn minified_state(&self) -> Value;
}
