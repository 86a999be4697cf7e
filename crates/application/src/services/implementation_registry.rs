//! Implementation registry
//!
//! Maps implementation paths to callables. Service modules fill it at
//! startup, so a typo in a catalog or mutation table is caught when the
//! harness is built instead of on first call.

use std::collections::HashMap;
use std::fmt;

use domain::ImplementationPath;

use crate::error::ApplicationError;
use crate::operation::{CallArgs, Operation, OperationResult, operation};

/// Registered implementations keyed by path
#[derive(Default, Clone)]
pub struct ImplementationRegistry {
    entries: HashMap<ImplementationPath, Operation>,
}

impl ImplementationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an implementation
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the path is already taken.
    pub fn register(
        &mut self,
        path: ImplementationPath,
        implementation: Operation,
    ) -> Result<(), ApplicationError> {
        if self.entries.contains_key(&path) {
            return Err(ApplicationError::Configuration(format!(
                "implementation '{path}' registered twice"
            )));
        }
        self.entries.insert(path, implementation);
        Ok(())
    }

    /// Parse `path` and register a closure under it
    ///
    /// # Errors
    ///
    /// Returns an error if the path is malformed or already taken.
    pub fn register_fn<F>(&mut self, path: &str, f: F) -> Result<(), ApplicationError>
    where
        F: Fn(&CallArgs) -> OperationResult + Send + Sync + 'static,
    {
        self.register(ImplementationPath::new(path)?, operation(f))
    }

    pub fn get(&self, path: &ImplementationPath) -> Option<Operation> {
        self.entries.get(path).cloned()
    }

    pub fn contains(&self, path: &ImplementationPath) -> bool {
        self.entries.contains_key(path)
    }

    /// Registered paths, sorted
    pub fn paths(&self) -> Vec<&ImplementationPath> {
        let mut paths: Vec<_> = self.entries.keys().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ImplementationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationRegistry")
            .field("paths", &self.paths())
            .finish()
    }
}
