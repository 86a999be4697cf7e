//! Declarative fault injection for simulated services.
//!
//! # Overview
//!
//! - `FaultConfig`: loads a service's `error_rules.json` and `error_kinds.json`
//! - `FaultPolicy`: validated rules joined with their error kinds
//! - `ChaosContext`: call counters, per-kind counts, run budget, dampened probabilities
//! - `FaultInjector`: evaluates the policy before every call
//!
//! # Example
//!
//! ```
//! use application::{CallArgs, FaultInjectionPort};
//! use domain::{OperationName, ServiceName};
//! use infrastructure::chaos::{FaultConfig, FaultInjector, FaultInjectorConfig};
//!
//! let config = FaultConfig::from_json(
//!     r#"[{ "operation": "send", "trigger": { "kind": "nth_call", "n": 2 },
//!           "error_kind": "down", "message": "call {call} failed" }]"#,
//!     r#"{ "down": "ConnectionError" }"#,
//! )
//! .unwrap();
//! let injector = FaultInjector::from_config(
//!     ServiceName::new("mail").unwrap(),
//!     config,
//!     FaultInjectorConfig::enabled().with_seed(42),
//! );
//!
//! let send = OperationName::new("send").unwrap();
//! assert!(injector.intercept(&send, &CallArgs::new()).is_none());
//! let fault = injector.intercept(&send, &CallArgs::new()).unwrap();
//! assert_eq!(fault.to_string(), "ConnectionError: call 2 failed");
//! ```

mod chaos_context;
mod fault_config;
mod fault_injector;
mod fault_policy;

pub use chaos_context::{ChaosContext, InjectionResult};
pub use fault_config::{ERROR_KINDS_FILE, ERROR_RULES_FILE, FaultConfig, FaultConfigError};
pub use fault_injector::{FAULT_FRAME_MODULE, FaultInjector, FaultInjectorConfig};
pub use fault_policy::{CompiledRule, FaultPolicy};
