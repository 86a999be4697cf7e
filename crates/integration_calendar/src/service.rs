//! Calendar service module

use std::path::Path;
use std::sync::Arc;

use application::{
    ApplicationError, CallArgs, ImplementationRegistry, MutationDefinition, OperationResult,
    ServiceModule,
};
use domain::{OperationEntry, ServiceName};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::info;

use crate::operations::{self, SharedStore};
use crate::store::CalendarStore;

pub const SERVICE_NAME: &str = "calendar";

type Handler = fn(&SharedStore, &CallArgs) -> OperationResult;

const OPERATIONS: &[(&str, &str)] = &[
    ("list_events", "calendar.events.list"),
    ("get_event", "calendar.events.get"),
    ("create_event", "calendar.events.create"),
    ("update_event", "calendar.events.update"),
    ("delete_event", "calendar.events.delete"),
];

const READ_ONLY: &[(&str, &str)] = &[
    ("create_event", "calendar.read_only.reject_write"),
    ("update_event", "calendar.read_only.reject_write"),
    ("delete_event", "calendar.read_only.reject_write"),
    ("free_busy", "calendar.read_only.free_busy"),
];

/// Simulated calendar API
#[derive(Debug, Clone, Default)]
pub struct CalendarService {
    store: SharedStore,
}

impl CalendarService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Service seeded with `store`
    pub fn with_store(store: CalendarStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Copy of the current store
    pub fn snapshot(&self) -> CalendarStore {
        self.store.read().clone()
    }
}

fn register_handler(
    registry: &mut ImplementationRegistry,
    store: &SharedStore,
    path: &str,
    handler: Handler,
) -> Result<(), ApplicationError> {
    let store = Arc::clone(store);
    registry.register_fn(path, move |args| handler(&store, args))
}

impl ServiceModule for CalendarService {
    fn name(&self) -> ServiceName {
        ServiceName::from_static(SERVICE_NAME)
    }

    fn operations(&self) -> Result<Vec<OperationEntry>, ApplicationError> {
        entries(OPERATIONS)
    }

    fn mutations(&self) -> Result<Vec<MutationDefinition>, ApplicationError> {
        Ok(vec![MutationDefinition::parse("read_only", READ_ONLY)?])
    }

    fn register(&self, registry: &mut ImplementationRegistry) -> Result<(), ApplicationError> {
        register_handler(registry, &self.store, "calendar.events.list", operations::list_events)?;
        register_handler(registry, &self.store, "calendar.events.get", operations::get_event)?;
        register_handler(registry, &self.store, "calendar.events.create", operations::create_event)?;
        register_handler(registry, &self.store, "calendar.events.update", operations::update_event)?;
        register_handler(registry, &self.store, "calendar.events.delete", operations::delete_event)?;
        register_handler(registry, &self.store, "calendar.read_only.free_busy", operations::free_busy)?;
        registry.register_fn("calendar.read_only.reject_write", operations::reject_write)
    }

    fn load_state(&self, path: &Path) -> Result<(), ApplicationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApplicationError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        let store: CalendarStore = serde_json::from_str(&raw).map_err(|e| {
            ApplicationError::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), events = store.events.len(), "Loaded calendar state");
        *self.store.write() = store;
        Ok(())
    }

    fn save_state(&self, path: &Path) -> Result<(), ApplicationError> {
        let raw = serde_json::to_string_pretty(&*self.store.read())
            .map_err(|e| ApplicationError::Internal(e.to_string()))?;
        std::fs::write(path, raw).map_err(|e| {
            ApplicationError::Internal(format!("Failed to write {}: {e}", path.display()))
        })
    }

    fn minified_state(&self) -> Value {
        self.store.read().minified()
    }
}

fn entries(table: &[(&str, &str)]) -> Result<Vec<OperationEntry>, ApplicationError> {
    table
        .iter()
        .map(|(operation, path)| Ok(OperationEntry::parse(operation, path)?))
        .collect()
}
