//! Callable operation types
//!
//! Operations take keyword arguments as a JSON object and either return a
//! JSON value or raise a shared [`OperationError`].

use std::sync::Arc;

use domain::{ErrorReport, OperationError, SharedOperationError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Keyword arguments of a call
pub type CallArgs = Map<String, Value>;

/// Result of invoking an implementation
pub type OperationResult = Result<Value, SharedOperationError>;

/// A registered implementation
pub type Operation = Arc<dyn Fn(&CallArgs) -> OperationResult + Send + Sync>;

/// Wrap a closure as an [`Operation`]
pub fn operation<F>(f: F) -> Operation
where
    F: Fn(&CallArgs) -> OperationResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Value handed back by a resolved operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CallOutcome {
    /// The implementation returned normally
    Completed(Value),
    /// The call raised and the error was captured as data
    Reported(ErrorReport),
}

impl CallOutcome {
    /// The returned value, if the call completed
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Reported(_) => None,
        }
    }

    /// The captured report, if the call failed in structured mode
    pub const fn report(&self) -> Option<&ErrorReport> {
        match self {
            Self::Completed(_) => None,
            Self::Reported(report) => Some(report),
        }
    }

    /// Whether the call raised
    pub const fn is_reported(&self) -> bool {
        matches!(self, Self::Reported(_))
    }

    /// Render as JSON
    pub fn to_value(&self) -> Value {
        match self {
            Self::Completed(value) => value.clone(),
            Self::Reported(report) => report.to_value(),
        }
    }
}

/// Fetch a required string argument
///
/// # Errors
///
/// Raises `KeyError` when absent and `TypeError` when not a string.
pub fn required_str<'a>(args: &'a CallArgs, name: &str) -> Result<&'a str, SharedOperationError> {
    match args.get(name) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(OperationError::new(
            "TypeError",
            format!("argument '{name}' must be a string, got {other}"),
        )
        .into_shared()),
        None => Err(OperationError::key_error(format!("missing argument '{name}'")).into_shared()),
    }
}

/// Fetch an optional string argument (null counts as absent)
///
/// # Errors
///
/// Raises `TypeError` when present but not a string.
pub fn optional_str<'a>(
    args: &'a CallArgs,
    name: &str,
) -> Result<Option<&'a str>, SharedOperationError> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(other) => Err(OperationError::new(
            "TypeError",
            format!("argument '{name}' must be a string, got {other}"),
        )
        .into_shared()),
    }
}
