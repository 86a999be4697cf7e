//! Calendar fixture store

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use domain::{OperationError, SharedOperationError};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

/// Calendar errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid timestamp for '{field}': {value}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Event must end after it starts")]
    EndBeforeStart,

    #[error("Summary must not be empty")]
    EmptySummary,
}

impl CalendarError {
    /// Raise as the simulated exception the API would produce
    pub fn into_operation_error(self, function: &str) -> SharedOperationError {
        let exception = match self {
            Self::EventNotFound(_) => "KeyError",
            _ => "ValueError",
        };
        OperationError::new(exception, self.to_string())
            .at("calendar.events", function)
            .into_shared()
    }
}

/// A calendar event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// Unique event ID
    pub id: String,
    /// Event summary/title
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start time (RFC 3339)
    pub start: String,
    /// End time (RFC 3339)
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub attendees: Vec<String>,
}

impl CalendarEvent {
    fn overlaps(&self, from: Option<DateTime<FixedOffset>>, to: Option<DateTime<FixedOffset>>) -> bool {
        let (Ok(start), Ok(end)) = (
            DateTime::parse_from_rfc3339(&self.start),
            DateTime::parse_from_rfc3339(&self.end),
        ) else {
            return true;
        };
        from.is_none_or(|from| end > from) && to.is_none_or(|to| start < to)
    }
}

/// Fields of a new event
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub summary: String,
    pub description: Option<String>,
    pub start: String,
    pub end: String,
    pub location: Option<String>,
    pub attendees: Vec<String>,
}

/// Fields to change on an existing event
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub location: Option<String>,
    pub attendees: Option<Vec<String>>,
}

/// All events, keyed by ID
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarStore {
    #[serde(default)]
    pub events: BTreeMap<String, CalendarEvent>,
    #[serde(default)]
    pub next_id: u64,
}

pub(crate) fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<DateTime<FixedOffset>, CalendarError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| CalendarError::InvalidTimestamp {
        field,
        value: value.to_string(),
    })
}

fn check_span(start: &str, end: &str) -> Result<(), CalendarError> {
    if parse_timestamp("end", end)? <= parse_timestamp("start", start)? {
        return Err(CalendarError::EndBeforeStart);
    }
    Ok(())
}

impl CalendarStore {
    /// Events overlapping `[from, to)`, ordered by start time
    pub fn list(&self, from: Option<&str>, to: Option<&str>) -> Result<Vec<CalendarEvent>, CalendarError> {
        let from = from.map(|v| parse_timestamp("start", v)).transpose()?;
        let to = to.map(|v| parse_timestamp("end", v)).transpose()?;
        let mut events: Vec<_> = self
            .events
            .values()
            .filter(|event| event.overlaps(from, to))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    pub fn get(&self, id: &str) -> Result<&CalendarEvent, CalendarError> {
        self.events
            .get(id)
            .ok_or_else(|| CalendarError::EventNotFound(id.to_string()))
    }

    /// Insert a new event, returning it with its assigned ID
    pub fn create(&mut self, draft: EventDraft) -> Result<CalendarEvent, CalendarError> {
        if draft.summary.trim().is_empty() {
            return Err(CalendarError::EmptySummary);
        }
        check_span(&draft.start, &draft.end)?;

        self.next_id += 1;
        let event = CalendarEvent {
            id: format!("evt-{}", self.next_id),
            summary: draft.summary,
            description: draft.description,
            start: draft.start,
            end: draft.end,
            location: draft.location,
            attendees: draft.attendees,
        };
        self.events.insert(event.id.clone(), event.clone());
        Ok(event)
    }

    /// Apply `patch` to an event
    pub fn update(&mut self, id: &str, patch: EventPatch) -> Result<CalendarEvent, CalendarError> {
        let current = self.get(id)?;
        let mut updated = current.clone();
        if let Some(summary) = patch.summary {
            if summary.trim().is_empty() {
                return Err(CalendarError::EmptySummary);
            }
            updated.summary = summary;
        }
        if let Some(start) = patch.start {
            updated.start = start;
        }
        if let Some(end) = patch.end {
            updated.end = end;
        }
        if patch.description.is_some() {
            updated.description = patch.description;
        }
        if patch.location.is_some() {
            updated.location = patch.location;
        }
        if let Some(attendees) = patch.attendees {
            updated.attendees = attendees;
        }
        check_span(&updated.start, &updated.end)?;

        self.events.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    pub fn delete(&mut self, id: &str) -> Result<CalendarEvent, CalendarError> {
        self.events
            .remove(id)
            .ok_or_else(|| CalendarError::EventNotFound(id.to_string()))
    }

    /// Compact view: one line of essentials per event
    pub fn minified(&self) -> Value {
        let events: Vec<Value> = self
            .events
            .values()
            .map(|e| json!({ "id": e.id, "summary": e.summary, "start": e.start }))
            .collect();
        json!({ "events": events })
    }
}
