//! Operation implementations

use std::sync::Arc;

use application::CallArgs;
use application::operation::{optional_str, required_str};
use domain::{OperationError, SharedOperationError};
use parking_lot::RwLock;
use serde_json::{Value, json};
use tracing::debug;

use crate::store::{Folder, MailStore, OutgoingMessage};

pub(crate) type SharedStore = Arc<RwLock<MailStore>>;

fn addresses(args: &CallArgs, name: &str) -> Result<Vec<String>, SharedOperationError> {
    let type_error = || {
        OperationError::new("TypeError", format!("'{name}' must be an address or a list of addresses"))
            .at("mail.messages", "addresses")
            .into_shared()
    };
    match args.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(single)) => Ok(vec![single.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(type_error))
            .collect(),
        Some(_) => Err(type_error()),
    }
}

fn optional_bool(args: &CallArgs, name: &str) -> Result<bool, SharedOperationError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(other) => Err(OperationError::new(
            "TypeError",
            format!("argument '{name}' must be a boolean, got {other}"),
        )
        .into_shared()),
    }
}

fn folder(args: &CallArgs, function: &str) -> Result<Folder, SharedOperationError> {
    optional_str(args, "folder")?
        .map_or(Ok(Folder::Inbox), Folder::parse)
        .map_err(|e| e.into_operation_error(function))
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, SharedOperationError> {
    serde_json::to_value(value).map_err(|e| OperationError::from_std("TypeError", &e).into_shared())
}

pub(crate) fn list_messages(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let folder = folder(args, "list_messages")?;
    let unread_only = optional_bool(args, "unread_only")?;
    let store = store.read();
    to_value(&store.list(folder, unread_only))
}

pub(crate) fn get_message(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let id = required_str(args, "message_id")?;
    let message = store
        .write()
        .open(id)
        .map_err(|e| e.into_operation_error("get_message"))?;
    to_value(&message)
}

pub(crate) fn send_email(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let outgoing = OutgoingMessage {
        to: addresses(args, "to")?,
        cc: addresses(args, "cc")?,
        subject: required_str(args, "subject")?.to_string(),
        body: optional_str(args, "body")?.unwrap_or_default().to_string(),
    };
    let message = store
        .write()
        .send(outgoing)
        .map_err(|e| e.into_operation_error("send_email"))?;
    debug!(message_id = %message.id, recipients = message.to.len(), "Sent mail");
    Ok(json!({ "message_id": message.id, "status": "sent" }))
}

pub(crate) fn delete_message(store: &SharedStore, args: &CallArgs) -> Result<Value, SharedOperationError> {
    let id = required_str(args, "message_id")?;
    let message = store
        .write()
        .delete(id)
        .map_err(|e| e.into_operation_error("delete_message"))?;
    Ok(json!({ "deleted": message.id }))
}

/// Older listing shape: identifiers and subjects only
pub(crate) fn legacy_list_messages(
    store: &SharedStore,
    args: &CallArgs,
) -> Result<Value, SharedOperationError> {
    let folder = folder(args, "list_messages")?;
    let store = store.read();
    let rows: Vec<Value> = store
        .list(folder, false)
        .into_iter()
        .map(|m| json!([m.id, m.subject]))
        .collect();
    Ok(Value::Array(rows))
}

pub(crate) fn count_unread(store: &SharedStore, _args: &CallArgs) -> Result<Value, SharedOperationError> {
    Ok(json!(store.read().unread_count()))
}
