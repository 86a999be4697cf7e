//! Fault injection configuration.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::default_true;
use crate::chaos::FaultInjectorConfig;

/// Per-service overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceFaultConfig {
    /// Disable or enable injection for this service only
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Run budget for this service only
    #[serde(default)]
    pub max_errors_per_run: Option<u64>,

    /// RNG seed for this service only
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Global fault injection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultInjectionAppConfig {
    /// Master switch
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding one sub-directory of rule files per service
    #[serde(default = "default_config_root")]
    pub config_root: PathBuf,

    /// RNG seed shared by all services unless overridden
    #[serde(default)]
    pub seed: Option<u64>,

    /// Run budget of each service unless overridden
    #[serde(default)]
    pub max_errors_per_run: Option<u64>,

    #[serde(default)]
    pub services: BTreeMap<String, ServiceFaultConfig>,
}

fn default_config_root() -> PathBuf {
    PathBuf::from("fault_config")
}

impl Default for FaultInjectionAppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            config_root: default_config_root(),
            seed: None,
            max_errors_per_run: None,
            services: BTreeMap::new(),
        }
    }
}

impl FaultInjectionAppConfig {
    /// Directory with the rule files of `service`
    pub fn dir_for(&self, service: &str) -> PathBuf {
        self.config_root.join(service)
    }

    /// Whether injection is on for `service`
    pub fn enabled_for(&self, service: &str) -> bool {
        self.enabled
            && self
                .services
                .get(service)
                .and_then(|s| s.enabled)
                .unwrap_or(true)
    }

    /// Injector settings of `service` with overrides applied
    pub fn injector_config_for(&self, service: &str) -> FaultInjectorConfig {
        let overrides = self.services.get(service);
        FaultInjectorConfig {
            enabled: self.enabled_for(service),
            seed: overrides.and_then(|s| s.seed).or(self.seed),
            max_errors_per_run: overrides
                .and_then(|s| s.max_errors_per_run)
                .or(self.max_errors_per_run),
        }
    }
}
