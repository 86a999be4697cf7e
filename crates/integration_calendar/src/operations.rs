//! Operation implementations
//!
//! Each function takes the shared store and the call's keyword arguments.

use std::sync::Arc;

use application::CallArgs;
use application::operation::{optional_str, required_str};
use domain::{OperationError, SharedOperationError};
use parking_lot::RwLock;
use serde_json::{Value, json};
use tracing::debug;

use crate::store::{CalendarStore, EventDraft, EventPatch};

pub(crate) type SharedStore = Arc<RwLock<CalendarStore>>;

const MODULE: &str = "calendar.events";

fn attendees(args: &CallArgs) -> Result<Option<Vec<String>>, SharedOperationError> {
    match args.get("attendees") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    OperationError::new("TypeError", "attendees must be a list of strings")
                        .at(MODULE, "attendees")
                        .into_shared()
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(OperationError::new("TypeError", "attendees must be a list")
            .at(MODULE, "attendees")
            .into_shared()),
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, SharedOperationError> {
    serde_json::to_value(value).map_err(|e| OperationError::from_std("TypeError", &e).into_shared())
}

pub(crate) fn list_events(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let from = optional_str(args, "start")?;
    let to = optional_str(args, "end")?;
    let events = store
        .read()
        .list(from, to)
        .map_err(|e| e.into_operation_error("list_events"))?;
    to_value(&events)
}

pub(crate) fn get_event(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let id = required_str(args, "event_id")?;
    let store = store.read();
    let event = store.get(id).map_err(|e| e.into_operation_error("get_event"))?;
    to_value(event)
}

pub(crate) fn create_event(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let draft = EventDraft {
        summary: required_str(args, "summary")?.to_string(),
        description: optional_str(args, "description")?.map(str::to_string),
        start: required_str(args, "start")?.to_string(),
        end: required_str(args, "end")?.to_string(),
        location: optional_str(args, "location")?.map(str::to_string),
        attendees: attendees(args)?.unwrap_or_default(),
    };
    let event = store
        .write()
        .create(draft)
        .map_err(|e| e.into_operation_error("create_event"))?;
    debug!(event_id = %event.id, "Created calendar event");
    to_value(&event)
}

pub(crate) fn update_event(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let id = required_str(args, "event_id")?;
    let patch = EventPatch {
        summary: optional_str(args, "summary")?.map(str::to_string),
        description: optional_str(args, "description")?.map(str::to_string),
        start: optional_str(args, "start")?.map(str::to_string),
        end: optional_str(args, "end")?.map(str::to_string),
        location: optional_str(args, "location")?.map(str::to_string),
        attendees: attendees(args)?,
    };
    let event = store
        .write()
        .update(id, patch)
        .map_err(|e| e.into_operation_error("update_event"))?;
    to_value(&event)
}

pub(crate) fn delete_event(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let id = required_str(args, "event_id")?;
    let event = store
        .write()
        .delete(id)
        .map_err(|e| e.into_operation_error("delete_event"))?;
    Ok(json!({ "deleted": event.id }))
}

/// Write operations under the `read_only` mutation
pub(crate) fn reject_write(args: &CallArgs) -> Result<Value, SharedOperationError> {
    let target = optional_str(args, "event_id")?.unwrap_or("new event");
    Err(OperationError::new(
        "PermissionError",
        format!("calendar is read-only, cannot modify {target}"),
    )
    .at("calendar.read_only", "reject_write")
    .into_shared())
}

/// Free/busy summary, only exposed by the `read_only` mutation
pub(crate) fn free_busy(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let from = optional_str(args, "start")?;
    let to = optional_str(args, "end")?;
    let events = store
        .read()
        .list(from, to)
        .map_err(|e| e.into_operation_error("free_busy"))?;
    let busy: Vec<Value> = events
        .iter()
        .map(|e| json!({ "start": e.start, "end": e.end }))
        .collect();
    Ok(json!({ "busy": busy }))
}
