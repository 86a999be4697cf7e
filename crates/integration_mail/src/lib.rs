//! Simulated mail service
//!
//! In-memory mailbox with send, read and delete operations, plus a
//! `legacy_inbox` mutation that mimics an older API revision.

mod operations;
pub mod service;
pub mod store;

pub use service::{MailService, SERVICE_NAME};
pub use store::{Folder, MailError, MailStore, Message, OutgoingMessage};
