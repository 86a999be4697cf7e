//! Application services
//!
//! Catalog, registry, mutation overlay, error reporting and the resolver
//! that ties them together.

mod capability_resolver;
mod error_reporting;
mod implementation_registry;
mod mutation_overlay;
mod operation_catalog;

pub use capability_resolver::{
    CallError, Harness, HarnessBuilder, OperationHandle, ResolvedOperation,
};
pub use error_reporting::{
    ERROR_MODE_ENV, ErrorMode, ErrorReportBuilder, ErrorReporter, MINI_TRACEBACK_DEPTH,
    current_mode,
};
pub use implementation_registry::ImplementationRegistry;
pub use mutation_overlay::{MutationDefinition, MutationLibrary, MutationOverlay};
pub use operation_catalog::{OperationCatalog, OperationCatalogBuilder};
