//! Declarative error rules for fault injection
//!
//! Rules are loaded from a per-service rule list; each one names an
//! operation, a trigger, the error kind to raise, and a message template.
//!
//! ```json
//! [
//!   { "operation": "create_event", "trigger": { "kind": "nth_call", "n": 3 },
//!     "error_kind": "quota", "message": "Quota exceeded on call {call}" },
//!   { "operation": "send_message", "trigger": { "kind": "predicate",
//!       "argument": "to", "condition": { "equals": "blocked@example.com" } },
//!     "error_kind": "rejected", "message": "Recipient {to} rejected" }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::DomainError;
use crate::value_objects::OperationName;

/// Condition over one keyword argument of a call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentCondition {
    /// Argument is present and equal to the value
    Equals(Value),
    /// Argument is absent or differs from the value
    NotEquals(Value),
    /// Argument is present (any value, including null)
    Present,
    /// Argument is absent
    Absent,
}

impl ArgumentCondition {
    /// Evaluate against the argument's value (`None` when absent)
    pub fn holds(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Equals(expected) => value == Some(expected),
            Self::NotEquals(expected) => value != Some(expected),
            Self::Present => value.is_some(),
            Self::Absent => value.is_none(),
        }
    }
}

/// When a rule fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Every call
    Always,
    /// Only the call whose per-operation counter equals `n` (1-based)
    NthCall { n: u64 },
    /// Each call independently with the given probability
    Probability {
        probability: f64,
        /// Fraction by which the probability shrinks after each firing
        #[serde(default)]
        dampen_factor: f64,
    },
    /// When a condition over a keyword argument holds
    Predicate {
        argument: String,
        condition: ArgumentCondition,
    },
}

impl Trigger {
    /// Short name used in logs and stats
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::NthCall { .. } => "nth_call",
            Self::Probability { .. } => "probability",
            Self::Predicate { .. } => "predicate",
        }
    }
}

/// One fault injection rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRule {
    /// Operation the rule applies to
    #[serde(alias = "operation")]
    pub operation_name: OperationName,
    /// Firing condition
    pub trigger: Trigger,
    /// Key into the error-kind dictionary
    pub error_kind: String,
    /// Message with `{operation}`, `{service}`, `{call}` and `{<argument>}` placeholders
    #[serde(alias = "message", default)]
    pub message_template: String,
}

impl ErrorRule {
    /// Check the rule's parameters
    pub fn validate(&self) -> Result<(), DomainError> {
        let op = self.operation_name.as_str();
        if self.error_kind.trim().is_empty() {
            return Err(DomainError::invalid_rule(op, "error_kind is empty"));
        }
        match &self.trigger {
            Trigger::Always => {},
            Trigger::NthCall { n } => {
                if *n == 0 {
                    return Err(DomainError::invalid_rule(op, "nth_call counts from 1"));
                }
            },
            Trigger::Probability {
                probability,
                dampen_factor,
            } => {
                if !(0.0..=1.0).contains(probability) {
                    return Err(DomainError::invalid_rule(
                        op,
                        format!("probability {probability} is outside [0, 1]"),
                    ));
                }
                if !(0.0..=1.0).contains(dampen_factor) {
                    return Err(DomainError::invalid_rule(
                        op,
                        format!("dampen_factor {dampen_factor} is outside [0, 1]"),
                    ));
                }
            },
            Trigger::Predicate { argument, .. } => {
                if argument.trim().is_empty() {
                    return Err(DomainError::invalid_rule(op, "predicate argument is empty"));
                }
            },
        }
        Ok(())
    }

    /// Render the message template for one call
    ///
    /// Unknown placeholders are left untouched. String arguments are
    /// inserted without quotes, everything else as compact JSON.
    pub fn render_message(&self, service: &str, call: u64, args: &Map<String, Value>) -> String {
        let mut message = self
            .message_template
            .replace("{operation}", self.operation_name.as_str())
            .replace("{service}", service)
            .replace("{call}", &call.to_string());
        for (name, value) in args {
            let placeholder = format!("{{{name}}}");
            if message.contains(&placeholder) {
                let rendered = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                message = message.replace(&placeholder, &rendered);
            }
        }
        message
    }
}

/// Entry of the error-kind dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorKindSpec {
    /// Exception type raised for this kind (e.g. `ValueError`)
    pub exception: String,
    /// Upper bound on how often this kind may be injected per run
    #[serde(default, alias = "num_errors_simulated")]
    pub max_occurrences: Option<u64>,
    /// Message used when the rule's template is empty
    #[serde(default)]
    pub default_message: Option<String>,
}
