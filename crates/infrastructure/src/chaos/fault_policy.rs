//! Fault policy: compiled error rules of one service.
//!
//! Joins the rule list with the error-kind dictionary, validating both, so
//! evaluation never has to deal with a rule whose kind is undefined.

use std::collections::BTreeMap;

use domain::{ErrorKindSpec, ErrorRule, Trigger};

use super::FaultConfigError;

/// A rule with its error kind resolved
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledRule {
    /// Position in the rule list
    pub index: usize,
    pub rule: ErrorRule,
    /// Exception type name raised when the rule fires
    pub exception: String,
    /// Message used when the rule's template is empty
    pub default_message: Option<String>,
}

impl CompiledRule {
    /// Starting probability of a probability-triggered rule
    pub const fn initial_probability(&self) -> Option<f64> {
        match self.rule.trigger {
            Trigger::Probability { probability, .. } => Some(probability),
            _ => None,
        }
    }

    /// Dampening factor of a probability-triggered rule
    pub const fn dampen_factor(&self) -> Option<f64> {
        match self.rule.trigger {
            Trigger::Probability { dampen_factor, .. } => Some(dampen_factor),
            _ => None,
        }
    }
}

/// Rules and error kinds of one service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaultPolicy {
    rules: Vec<CompiledRule>,
    kinds: BTreeMap<String, ErrorKindSpec>,
}

impl FaultPolicy {
    /// Policy that never fires
    pub fn never() -> Self {
        Self::default()
    }

    /// Validate and join rules with their error kinds
    ///
    /// # Errors
    ///
    /// Returns `FaultConfigError::Invalid` if a rule has bad parameters or
    /// names an error kind missing from `kinds`.
    pub fn compile(
        rules: Vec<ErrorRule>,
        kinds: BTreeMap<String, ErrorKindSpec>,
    ) -> Result<Self, FaultConfigError> {
        for (name, spec) in &kinds {
            if spec.exception.trim().is_empty() {
                return Err(FaultConfigError::Invalid(format!(
                    "error kind '{name}' has an empty exception type"
                )));
            }
        }

        let rules = rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| {
                rule.validate()
                    .map_err(|e| FaultConfigError::Invalid(e.to_string()))?;
                let spec = kinds.get(&rule.error_kind).ok_or_else(|| {
                    FaultConfigError::Invalid(format!(
                        "rule {index} for '{}' references undefined error kind '{}'",
                        rule.operation_name, rule.error_kind
                    ))
                })?;
                Ok(CompiledRule {
                    index,
                    exception: spec.exception.clone(),
                    default_message: spec.default_message.clone(),
                    rule,
                })
            })
            .collect::<Result<Vec<_>, FaultConfigError>>()?;

        Ok(Self { rules, kinds })
    }

    /// Rules for `operation`, in declaration order
    pub fn rules_for<'a>(&'a self, operation: &'a str) -> impl Iterator<Item = &'a CompiledRule> {
        self.rules
            .iter()
            .filter(move |compiled| compiled.rule.operation_name.as_str() == operation)
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub const fn kinds(&self) -> &BTreeMap<String, ErrorKindSpec> {
        &self.kinds
    }

    /// Injection cap of an error kind
    pub fn max_occurrences(&self, kind: &str) -> Option<u64> {
        self.kinds.get(kind).and_then(|spec| spec.max_occurrences)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn kinds() -> BTreeMap<String, ErrorKindSpec> {
        serde_json::from_value(json!({
            "quota": { "exception": "ValueError", "max_occurrences": 2 },
            "down": { "exception": "ConnectionError", "default_message": "service down" }
        }))
        .unwrap()
    }

    fn rules(value: serde_json::Value) -> Vec<ErrorRule> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn compile_joins_kinds() {
        let policy = FaultPolicy::compile(
            rules(json!([
                { "operation": "send", "trigger": { "kind": "always" }, "error_kind": "down" },
                { "operation": "list", "trigger": { "kind": "probability", "probability": 0.5,
                  "dampen_factor": 0.1 }, "error_kind": "quota" }
            ])),
            kinds(),
        )
        .unwrap();

        let send: Vec<_> = policy.rules_for("send").collect();
        assert_eq!(send.len(), 1);
        assert_eq!(send[0].exception, "ConnectionError");
        assert_eq!(send[0].default_message.as_deref(), Some("service down"));

        let list: Vec<_> = policy.rules_for("list").collect();
        assert_eq!(list[0].index, 1);
        assert!(list[0].initial_probability().is_some_and(|p| (p - 0.5).abs() < f64::EPSILON));
        assert!(list[0].dampen_factor().is_some_and(|d| (d - 0.1).abs() < f64::EPSILON));
        assert_eq!(policy.max_occurrences("quota"), Some(2));
        assert_eq!(policy.max_occurrences("down"), None);
    }

    #[test]
    fn undefined_kind_is_rejected() {
        let err = FaultPolicy::compile(
            rules(json!([
                { "operation": "send", "trigger": { "kind": "always" }, "error_kind": "nope" }
            ])),
            kinds(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("undefined error kind 'nope'"));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let result = FaultPolicy::compile(
            rules(json!([
                { "operation": "send", "trigger": { "kind": "nth_call", "n": 0 }, "error_kind": "down" }
            ])),
            kinds(),
        );
        assert!(matches!(result, Err(FaultConfigError::Invalid(_))));

        let result = FaultPolicy::compile(
            rules(json!([
                { "operation": "send", "trigger": { "kind": "probability", "probability": 2.0 },
                  "error_kind": "down" }
            ])),
            kinds(),
        );
        assert!(matches!(result, Err(FaultConfigError::Invalid(_))));
    }

    #[test]
    fn empty_exception_type_is_rejected() {
        let mut kinds = kinds();
        kinds.insert(
            "blank".into(),
            ErrorKindSpec {
                exception: " ".into(),
                max_occurrences: None,
                default_message: None,
            },
        );
        assert!(FaultPolicy::compile(Vec::new(), kinds).is_err());
    }

    #[test]
    fn never_is_empty() {
        assert!(FaultPolicy::never().is_empty());
        assert_eq!(FaultPolicy::never().rules_for("x").count(), 0);
    }
}
