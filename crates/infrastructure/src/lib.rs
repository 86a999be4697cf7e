//! Infrastructure layer - Adapters and process wiring
//!
//! Implements the fault injection port, loads application configuration,
//! installs tracing and assembles a [`application::Harness`] over the
//! built-in services.

pub mod adapters;
pub mod bootstrap;
pub mod chaos;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use bootstrap::{build_harness, build_harness_with, builtin_services};
pub use chaos::{FaultConfig, FaultConfigError, FaultInjector, FaultInjectorConfig, FaultPolicy};
pub use config::{
    AppConfig, ErrorReportingAppConfig, FaultInjectionAppConfig, ServiceFaultConfig,
    TelemetryAppConfig,
};
pub use telemetry::{TelemetryError, init_tracing};
