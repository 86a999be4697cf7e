//! Simulated calendar service
//!
//! In-memory calendar with event CRUD operations and a `read_only`
//! mutation that rejects every write.

mod operations;
pub mod service;
pub mod store;

pub use service::{CalendarService, SERVICE_NAME};
pub use store::{CalendarError, CalendarEvent, CalendarStore, EventDraft, EventPatch};
