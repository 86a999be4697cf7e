//! Application configuration
//!
//! Loaded from an optional `simharness.toml` (or an explicit file) and
//! overridden by `SIMHARNESS__`-prefixed environment variables, e.g.
//! `SIMHARNESS__FAULT_INJECTION__SEED=7`.

mod error_reporting;
mod fault_injection;
mod telemetry;

use std::collections::BTreeMap;
use std::path::Path;

use application::{ApplicationError, ErrorMode};
use serde::{Deserialize, Serialize};

pub use error_reporting::ErrorReportingAppConfig;
pub use fault_injection::{FaultInjectionAppConfig, ServiceFaultConfig};
pub use telemetry::TelemetryAppConfig;

/// Default configuration file stem, looked up in the working directory
pub const CONFIG_FILE_STEM: &str = "simharness";

/// Prefix of overriding environment variables
pub const ENV_PREFIX: &str = "SIMHARNESS";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub error_reporting: ErrorReportingAppConfig,

    #[serde(default)]
    pub fault_injection: FaultInjectionAppConfig,

    #[serde(default)]
    pub telemetry: TelemetryAppConfig,

    /// Mutation to activate at startup, per service
    #[serde(default)]
    pub mutations: BTreeMap<String, String>,
}

const fn default_true() -> bool {
    true
}

impl AppConfig {
    /// Load configuration from environment and optional file
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, reading `path` instead of the default file
    ///
    /// An explicit file must exist; the default one is optional.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(CONFIG_FILE_STEM).required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            // Override with environment variables (e.g., SIMHARNESS__ERROR_REPORTING__MODE)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Check settings that cannot be expressed through serde
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the error mode environment variable
    /// holds an unknown value or a mutation entry is blank.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        ErrorMode::from_env()?;

        for (service, mutation) in &self.mutations {
            if service.trim().is_empty() || mutation.trim().is_empty() {
                return Err(ApplicationError::Configuration(format!(
                    "blank mutation entry '{service}' = '{mutation}'"
                )));
            }
        }
        Ok(())
    }

    /// Error mode after applying the file and the environment
    pub fn error_mode(&self) -> ErrorMode {
        self.error_reporting.effective_mode()
    }
}
