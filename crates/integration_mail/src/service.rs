//! Mail service module

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
use crate::store::MailStore;

pub const SERVICE_NAME: &str = "mail";

type Handler = fn(&SharedStore, &CallArgs) -> OperationResult;

const IMPLEMENTATIONS: &[(&str, Handler)] = &[
    ("mail.messages.list", operations::list_messages),
    ("mail.messages.get", operations::get_message),
    ("mail.messages.send", operations::send_email),
    ("mail.messages.delete", operations::delete_message),
    ("mail.legacy.list", operations::legacy_list_messages),
    ("mail.legacy.count_unread", operations::count_unread),
];

const OPERATIONS: &[(&str, &str)] = &[
    ("list_messages", "mail.messages.list"),
    ("get_message", "mail.messages.get"),
    ("send_email", "mail.messages.send"),
    ("delete_message", "mail.messages.delete"),
];

const LEGACY_INBOX: &[(&str, &str)] = &[
    ("list_messages", "mail.legacy.list"),
    ("count_unread", "mail.legacy.count_unread"),
];

/// Simulated mail API
#[derive(Debug, Clone, Default)]
pub struct MailService {
    store: SharedStore,
}

impl MailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: MailStore) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
        }
    }

    /// Copy of the current mailbox
    pub fn snapshot(&self) -> MailStore {
        self.store.read().clone()
    }

    /// Deliver a message to the inbox
    pub fn deliver(&self, from: &str, subject: &str, body: &str) -> String {
        self.store.write().receive(from, subject, body).id
    }
}

impl ServiceModule for MailService {
    fn name(&self) -> ServiceName {
        ServiceName::from_static(SERVICE_NAME)
    }

    fn operations(&self) -> Result<Vec<OperationEntry>, ApplicationError> {
        OPERATIONS
            .iter()
            .map(|(operation, path)| Ok(OperationEntry::parse(operation, path)?))
            .collect()
    }

    fn mutations(&self) -> Result<Vec<MutationDefinition>, ApplicationError> {
        Ok(vec![MutationDefinition::parse("legacy_inbox", LEGACY_INBOX)?])
    }

    fn register(&self, registry: &mut ImplementationRegistry) -> Result<(), ApplicationError> {
        for &(path, handler) in IMPLEMENTATIONS {
            let store = Arc::clone(&self.store);
            registry.register_fn(path, move |args| handler(&store, args))?;
        }
        Ok(())
    }

    fn load_state(&self, path: &Path) -> Result<(), ApplicationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ApplicationError::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        let store: MailStore = serde_json::from_str(&raw).map_err(|e| {
            ApplicationError::Configuration(format!("Failed to parse {}: {e}", path.display()))
        })?;
        info!(path = %path.display(), messages = store.messages.len(), "Loaded mail state");
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
