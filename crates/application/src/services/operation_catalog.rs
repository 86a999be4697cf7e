//! Operation catalog
//!
//! Static per-service mapping from public operation names to
//! implementation paths. Read-only once built.

use std::collections::BTreeMap;

use domain::{ImplementationPath, OperationEntry, OperationName, ServiceName};

use crate::error::ApplicationError;

/// Base operation tables of all services
#[derive(Debug, Clone, Default)]
pub struct OperationCatalog {
    services: BTreeMap<ServiceName, BTreeMap<OperationName, ImplementationPath>>,
}

impl OperationCatalog {
    pub fn builder() -> OperationCatalogBuilder {
        OperationCatalogBuilder::default()
    }

    /// Implementation path of `operation` in `service`
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` or `UnknownOperation`.
    pub fn lookup(&self, service: &str, operation: &str) -> Result<&ImplementationPath, ApplicationError> {
        self.table(service)?
            .get(operation)
            .ok_or_else(|| ApplicationError::unknown_operation(service, operation))
    }

    /// Operation names of `service`, sorted
    ///
    /// # Errors
    ///
    /// Returns `UnknownService`.
    pub fn operations(&self, service: &str) -> Result<Vec<&OperationName>, ApplicationError> {
        Ok(self.table(service)?.keys().collect())
    }

    /// Entries of `service`, sorted by operation name
    ///
    /// # Errors
    ///
    /// Returns `UnknownService`.
    pub fn entries(&self, service: &str) -> Result<Vec<OperationEntry>, ApplicationError> {
        Ok(self
            .table(service)?
            .iter()
            .map(|(op, path)| OperationEntry::new(op.clone(), path.clone()))
            .collect())
    }

    pub fn services(&self) -> impl Iterator<Item = &ServiceName> {
        self.services.keys()
    }

    pub fn contains_service(&self, service: &str) -> bool {
        self.services.contains_key(service)
    }

    /// Every implementation path referenced by the catalog
    pub fn implementation_paths(&self) -> impl Iterator<Item = (&ServiceName, &ImplementationPath)> {
        self.services
            .iter()
            .flat_map(|(service, table)| table.values().map(move |path| (service, path)))
    }

    fn table(
        &self,
        service: &str,
    ) -> Result<&BTreeMap<OperationName, ImplementationPath>, ApplicationError> {
        self.services
            .get(service)
            .ok_or_else(|| ApplicationError::UnknownService(service.to_string()))
    }
}

/// Collects service tables and validates them on [`build`](Self::build)
#[derive(Debug, Default)]
pub struct OperationCatalogBuilder {
    tables: Vec<(ServiceName, Vec<OperationEntry>)>,
}

impl OperationCatalogBuilder {
    /// Add the operation table of one service
    #[must_use]
    pub fn service(mut self, name: ServiceName, entries: Vec<OperationEntry>) -> Self {
        self.tables.push((name, entries));
        self
    }

    /// Build the catalog
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a service is added twice or an
    /// operation name repeats within one service.
    pub fn build(self) -> Result<OperationCatalog, ApplicationError> {
        let mut services = BTreeMap::new();
        for (service, entries) in self.tables {
            if services.contains_key(&service) {
                return Err(ApplicationError::Configuration(format!(
                    "service '{service}' added to the catalog twice"
                )));
            }
            let mut table = BTreeMap::new();
            for entry in entries {
                if table.contains_key(&entry.operation_name) {
                    return Err(ApplicationError::DuplicateOperation {
                        service: service.to_string(),
                        operation: entry.operation_name.into_inner(),
                    });
                }
                table.insert(entry.operation_name, entry.implementation_path);
            }
            services.insert(service, table);
        }
        Ok(OperationCatalog { services })
    }
}
