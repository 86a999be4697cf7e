//! Mutation library and overlay
//!
//! A mutation is a named alternate implementation set for some operations
//! of one service. The [`MutationLibrary`] holds every mutation a service
//! ships; the [`MutationOverlay`] keeps, per service, a stack of activated
//! frames. Only the topmost frame takes part in resolution, and operations
//! it does not override fall through to the base catalog.
//!
//! Revert is a strict pop. Reverting an empty stack is an error, since the
//! caller lost track of what it activated.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use domain::{
    ImplementationPath, MutationFrame, MutationName, OperationEntry, OperationName, ServiceName,
};
use tracing::{debug, info};

use crate::error::ApplicationError;
use crate::services::OperationCatalog;

/// One named override table, as shipped by a service module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationDefinition {
    pub name: MutationName,
    /// May redirect existing operations or add new ones
    pub overrides: Vec<OperationEntry>,
}

impl MutationDefinition {
    pub const fn new(name: MutationName, overrides: Vec<OperationEntry>) -> Self {
        Self { name, overrides }
    }

    /// Build from raw `(operation, path)` pairs
    ///
    /// # Errors
    ///
    /// Returns an error if a name or path is malformed.
    pub fn parse(name: &str, overrides: &[(&str, &str)]) -> Result<Self, ApplicationError> {
        let overrides = overrides
            .iter()
            .map(|(op, path)| OperationEntry::parse(op, path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(MutationName::new(name)?, overrides))
    }
}

type OverrideTable = BTreeMap<OperationName, ImplementationPath>;

/// All mutations known per service
#[derive(Debug, Clone, Default)]
pub struct MutationLibrary {
    services: BTreeMap<ServiceName, BTreeMap<MutationName, OverrideTable>>,
}

impl MutationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mutation for `service`
    ///
    /// # Errors
    ///
    /// Returns a configuration error on a repeated mutation name or a
    /// repeated operation inside the override table.
    pub fn add(
        &mut self,
        service: &ServiceName,
        definition: MutationDefinition,
    ) -> Result<(), ApplicationError> {
        let mutations = self.services.entry(service.clone()).or_default();
        if mutations.contains_key(&definition.name) {
            return Err(ApplicationError::Configuration(format!(
                "mutation '{}' defined twice for service '{service}'",
                definition.name
            )));
        }

        let mut table = OverrideTable::new();
        for entry in definition.overrides {
            if table.contains_key(&entry.operation_name) {
                return Err(ApplicationError::DuplicateOperation {
                    service: format!("{service}/{}", definition.name),
                    operation: entry.operation_name.into_inner(),
                });
            }
            table.insert(entry.operation_name, entry.implementation_path);
        }
        mutations.insert(definition.name, table);
        Ok(())
    }

    /// Override table of one mutation
    ///
    /// # Errors
    ///
    /// Returns `UnknownMutation` if the service does not define it.
    pub fn get(&self, service: &str, mutation: &str) -> Result<&OverrideTable, ApplicationError> {
        self.services
            .get(service)
            .and_then(|mutations| mutations.get(mutation))
            .ok_or_else(|| ApplicationError::unknown_mutation(service, mutation))
    }

    /// Mutation names of `service`, sorted
    pub fn mutation_names(&self, service: &str) -> Vec<&MutationName> {
        self.services
            .get(service)
            .map(|mutations| mutations.keys().collect())
            .unwrap_or_default()
    }

    /// Every implementation path referenced by any mutation
    pub fn implementation_paths(
        &self,
    ) -> impl Iterator<Item = (&ServiceName, &MutationName, &ImplementationPath)> {
        self.services.iter().flat_map(|(service, mutations)| {
            mutations.iter().flat_map(move |(mutation, table)| {
                table.values().map(move |path| (service, mutation, path))
            })
        })
    }
}

/// Per-service stacks of activated mutation frames
#[derive(Debug, Clone, Default)]
pub struct MutationOverlay {
    stacks: HashMap<ServiceName, Vec<MutationFrame>>,
}

impl MutationOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the named mutation of `service`
    ///
    /// # Errors
    ///
    /// Returns `UnknownMutation` if the library has no such mutation.
    pub fn activate(
        &mut self,
        library: &MutationLibrary,
        service: &ServiceName,
        mutation: &str,
    ) -> Result<&MutationFrame, ApplicationError> {
        let overrides = library.get(service.as_str(), mutation)?.clone();
        let frame = MutationFrame::new(service.clone(), MutationName::new(mutation)?, overrides);

        let stack = self.stacks.entry(service.clone()).or_default();
        stack.push(frame);
        info!(
            service = %service,
            mutation = %mutation,
            depth = stack.len(),
            "Activated mutation"
        );
        stack
            .last()
            .ok_or_else(|| ApplicationError::Internal("mutation stack empty after push".into()))
    }

    /// Name of the topmost frame, `None` when the base catalog is active
    pub fn current_mutation_name(&self, service: &str) -> Option<&MutationName> {
        self.top(service).map(|frame| &frame.mutation_name)
    }

    /// Pop the topmost frame of `service`
    ///
    /// # Errors
    ///
    /// Returns `NoActiveMutation` and leaves state unchanged if the stack
    /// is empty.
    pub fn revert(&mut self, service: &str) -> Result<MutationFrame, ApplicationError> {
        let frame = self
            .stacks
            .get_mut(service)
            .and_then(Vec::pop)
            .ok_or_else(|| ApplicationError::NoActiveMutation(service.to_string()))?;
        info!(
            service = %service,
            mutation = %frame.mutation_name,
            depth = self.depth(service),
            "Reverted mutation"
        );
        Ok(frame)
    }

    /// Pop every frame of `service`, returning how many were popped
    pub fn revert_all(&mut self, service: &str) -> usize {
        let popped = self.stacks.remove(service).as_ref().map_or(0, Vec::len);
        if popped > 0 {
            info!(service = %service, popped, "Reverted all mutations");
        }
        popped
    }

    /// Number of stacked frames for `service`
    pub fn depth(&self, service: &str) -> usize {
        self.stacks.get(service).map_or(0, Vec::len)
    }

    /// Implementation path currently active for `(service, operation)`
    ///
    /// # Errors
    ///
    /// Returns a resolution error if neither the topmost frame nor the
    /// catalog knows the operation.
    pub fn resolve_path<'a>(
        &'a self,
        service: &str,
        operation: &str,
        catalog: &'a OperationCatalog,
    ) -> Result<&'a ImplementationPath, ApplicationError> {
        if let Some(frame) = self.top(service)
            && let Some(path) = frame.overrides.get(operation)
        {
            debug!(
                service = %service,
                operation = %operation,
                mutation = %frame.mutation_name,
                path = %path,
                "Resolved through mutation"
            );
            return Ok(path);
        }
        catalog.lookup(service, operation)
    }

    /// Base operations of `service` plus those added by the topmost frame
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` if the catalog does not know the service.
    pub fn operation_names(
        &self,
        service: &str,
        catalog: &OperationCatalog,
    ) -> Result<BTreeSet<OperationName>, ApplicationError> {
        let mut names: BTreeSet<OperationName> =
            catalog.operations(service)?.into_iter().cloned().collect();
        if let Some(frame) = self.top(service) {
            names.extend(frame.overrides.keys().cloned());
        }
        Ok(names)
    }

    /// Active mutation names per service, bottom of the stack first
    pub fn active_mutations(&self) -> BTreeMap<ServiceName, Vec<MutationName>> {
        self.stacks
            .iter()
            .filter(|(_, stack)| !stack.is_empty())
            .map(|(service, stack)| {
                (
                    service.clone(),
                    stack.iter().map(|f| f.mutation_name.clone()).collect(),
                )
            })
            .collect()
    }

    fn top(&self, service: &str) -> Option<&MutationFrame> {
        self.stacks.get(service).and_then(|stack| stack.last())
    }
}
