//! Fault injection port
//!
//! The resolver consults one injector per service before every call. The
//! injector decides whether a simulated failure replaces the real
//! implementation; implementations live in the infrastructure layer.

use std::collections::BTreeMap;
use std::sync::Arc;

use domain::{OperationName, ServiceName, SharedOperationError};
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::error::ApplicationError;
use crate::operation::{CallArgs, Operation};

/// Current probability of one probability-triggered rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleProbability {
    pub operation: String,
    pub error_kind: String,
    pub initial: f64,
    pub current: f64,
}

/// Debug snapshot of an injector
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FaultStats {
    pub service: String,
    pub enabled: bool,
    /// Invocations seen across all operations
    pub total_calls: u64,
    pub faults_injected: u64,
    /// Budget across all kinds, if limited
    pub max_errors_per_run: Option<u64>,
    pub calls_per_operation: BTreeMap<String, u64>,
    pub injected_per_kind: BTreeMap<String, u64>,
    pub rule_probabilities: Vec<RuleProbability>,
}

/// Per-service fault injector
#[cfg_attr(test, automock)]
pub trait FaultInjectionPort: Send + Sync {
    /// Whether any rule is loaded
    fn is_enabled(&self) -> bool;

    /// Count the call and return the simulated failure if a rule triggers
    fn intercept(&self, operation: &OperationName, args: &CallArgs) -> Option<SharedOperationError>;

    /// Debug snapshot
    fn stats(&self) -> FaultStats;

    /// Reset counters, budgets and dampened probabilities
    fn reset(&self);
}

/// Builds the injector of a service on first use
#[cfg_attr(test, automock)]
pub trait FaultInjectorProvider: Send + Sync {
    /// Injector for `service`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the service's fault configuration
    /// exists but is malformed.
    fn injector_for(
        &self,
        service: &ServiceName,
    ) -> Result<Arc<dyn FaultInjectionPort>, ApplicationError>;
}

/// Pass-through injector
#[derive(Debug, Default, Clone)]
pub struct NoFaultInjection {
    service: String,
}

impl NoFaultInjection {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl FaultInjectionPort for NoFaultInjection {
    fn is_enabled(&self) -> bool {
        false
    }

    fn intercept(&self, _operation: &OperationName, _args: &CallArgs) -> Option<SharedOperationError> {
        None
    }

    fn stats(&self) -> FaultStats {
        FaultStats {
            service: self.service.clone(),
            ..FaultStats::default()
        }
    }

    fn reset(&self) {}
}

/// Provider that disables injection for every service
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFaultInjectionProvider;

impl FaultInjectorProvider for NoFaultInjectionProvider {
    fn injector_for(
        &self,
        service: &ServiceName,
    ) -> Result<Arc<dyn FaultInjectionPort>, ApplicationError> {
        Ok(Arc::new(NoFaultInjection::new(service.as_str())))
    }
}

/// Wrap `inner` so that `injector` may short-circuit each call
pub fn with_faults(
    injector: Arc<dyn FaultInjectionPort>,
    operation: OperationName,
    inner: Operation,
) -> Operation {
    Arc::new(move |args: &CallArgs| {
        if let Some(fault) = injector.intercept(&operation, args) {
            return Err(fault);
        }
        inner(args)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::operation;
    use domain::OperationError;
    use serde_json::json;

    #[test]
    fn pass_through_never_intercepts() {
        let injector = NoFaultInjection::new("mail");
        let op = OperationName::new("send").unwrap();
        assert!(injector.intercept(&op, &CallArgs::new()).is_none());
        assert!(!injector.stats().enabled);
    }

    #[test]
    fn wrapper_short_circuits_on_fault() {
        let mut mock = MockFaultInjectionPort::new();
        mock.expect_intercept()
            .times(1)
            .returning(|_, _| Some(OperationError::value_error("injected").into_shared()));

        let inner = operation(|_| panic!("inner must not run"));
        let wrapped = with_faults(Arc::new(mock), OperationName::new("send").unwrap(), inner);

        let err = wrapped(&CallArgs::new()).unwrap_err();
        assert_eq!(err.message(), "injected");
    }

    #[test]
    fn wrapper_delegates_without_fault() {
        let mut mock = MockFaultInjectionPort::new();
        mock.expect_intercept().returning(|_, _| None);

        let inner = operation(|_| Ok(json!("ok")));
        let wrapped = with_faults(Arc::new(mock), OperationName::new("send").unwrap(), inner);
        assert_eq!(wrapped(&CallArgs::new()).unwrap(), json!("ok"));
    }
}
