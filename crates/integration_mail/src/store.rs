//! Mailbox fixture store

use std::collections::BTreeMap;
use std::fmt;

use domain::{OperationError, SharedOperationError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Mail errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailError {
    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Invalid recipient address: {0}")]
    InvalidRecipient(String),

    #[error("At least one recipient is required")]
    NoRecipients,

    #[error("Unknown folder: {0}")]
    UnknownFolder(String),
}

impl MailError {
    /// Raise as the simulated exception the API would produce
    pub fn into_operation_error(self, function: &str) -> SharedOperationError {
        let exception = match self {
            Self::MessageNotFound(_) => "KeyError",
            _ => "ValueError",
        };
        OperationError::new(exception, self.to_string())
            .at("mail.messages", function)
            .into_shared()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Folder {
    #[default]
    Inbox,
    Sent,
}

impl Folder {
    pub fn parse(raw: &str) -> Result<Self, MailError> {
        match raw {
            "inbox" => Ok(Self::Inbox),
            "sent" => Ok(Self::Sent),
            other => Err(MailError::UnknownFolder(other.to_string())),
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inbox => f.write_str("inbox"),
            Self::Sent => f.write_str("sent"),
        }
    }
}

/// A stored message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub from: String,
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub folder: Folder,
    #[serde(default)]
    pub read: bool,
}

/// A message to send
#[derive(Debug, Clone, Default)]
pub struct OutgoingMessage {
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub subject: String,
    pub body: String,
}

fn default_address() -> String {
    "me@example.com".to_string()
}

/// Mailbox of one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailStore {
    /// Address of the mailbox owner
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub messages: BTreeMap<String, Message>,
    #[serde(default)]
    pub next_id: u64,
}

impl Default for MailStore {
    fn default() -> Self {
        Self {
            address: default_address(),
            messages: BTreeMap::new(),
            next_id: 0,
        }
    }
}

fn check_address(address: &str) -> Result<(), MailError> {
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(MailError::InvalidRecipient(address.to_string())),
    }
}

impl MailStore {
    /// Messages in `folder`, newest first
    pub fn list(&self, folder: Folder, unread_only: bool) -> Vec<&Message> {
        self.messages
            .values()
            .rev()
            .filter(|m| m.folder == folder && (!unread_only || !m.read))
            .collect()
    }

    pub fn get(&self, id: &str) -> Result<&Message, MailError> {
        self.messages
            .get(id)
            .ok_or_else(|| MailError::MessageNotFound(id.to_string()))
    }

    /// Fetch a message and mark it read
    pub fn open(&mut self, id: &str) -> Result<Message, MailError> {
        let message = self
            .messages
            .get_mut(id)
            .ok_or_else(|| MailError::MessageNotFound(id.to_string()))?;
        message.read = true;
        Ok(message.clone())
    }

    /// File an outgoing message under `sent`
    pub fn send(&mut self, outgoing: OutgoingMessage) -> Result<Message, MailError> {
        if outgoing.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        for address in outgoing.to.iter().chain(&outgoing.cc) {
            check_address(address)?;
        }

        self.next_id += 1;
        let message = Message {
            id: format!("msg-{:04}", self.next_id),
            from: self.address.clone(),
            to: outgoing.to,
            cc: outgoing.cc,
            subject: outgoing.subject,
            body: outgoing.body,
            folder: Folder::Sent,
            read: true,
        };
        self.messages.insert(message.id.clone(), message.clone());
        Ok(message)
    }

    /// Deliver a message to the inbox, used for fixtures
    pub fn receive(&mut self, from: &str, subject: &str, body: &str) -> Message {
        self.next_id += 1;
        let message = Message {
            id: format!("msg-{:04}", self.next_id),
            from: from.to_string(),
            to: vec![self.address.clone()],
            cc: Vec::new(),
            subject: subject.to_string(),
            body: body.to_string(),
            folder: Folder::Inbox,
            read: false,
        };
        self.messages.insert(message.id.clone(), message.clone());
        message
    }

    pub fn delete(&mut self, id: &str) -> Result<Message, MailError> {
        self.messages
            .remove(id)
            .ok_or_else(|| MailError::MessageNotFound(id.to_string()))
    }

    pub fn unread_count(&self) -> usize {
        self.messages
            .values()
            .filter(|m| m.folder == Folder::Inbox && !m.read)
            .count()
    }

    /// Compact view: headers only
    pub fn minified(&self) -> Value {
        let messages: Vec<Value> = self
            .messages
            .values()
            .map(|m| {
                json!({
                    "id": m.id,
                    "folder": m.folder,
                    "from": m.from,
                    "subject": m.subject,
                    "read": m.read,
                })
            })
            .collect();
        json!({ "address": self.address, "messages": messages })
    }
}
