//! Structured error reports
//!
//! Produced for every caught failure when the error reporting mode is
//! `structured`; never persisted. Keys serialise in camelCase
//! (`exceptionType`, `miniTraceback`).

use serde::{Deserialize, Serialize};

/// One link of an error's cause/context chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CauseEntry {
    pub exception_type: String,
    pub message: String,
    pub module: String,
    pub function: String,
    pub mini_traceback: Vec<String>,
}

/// Diagnostic returned in place of a raised error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    /// ISO-8601 timestamp of when the report was built
    pub timestamp: String,
    pub exception_type: String,
    pub message: String,
    /// Origin module (the service when a logical origin is supplied)
    pub module: String,
    /// Origin function (the operation when a logical origin is supplied)
    pub function: String,
    /// Traceback lines, outermost first, ending with `<Type>: <message>`
    pub traceback: Vec<String>,
    pub causes: Vec<CauseEntry>,
}

impl ErrorReport {
    /// Serialise to a JSON value
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
