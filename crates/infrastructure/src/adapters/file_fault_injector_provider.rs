//! File-backed fault injector provider
//!
//! Looks up `<config_root>/<service>/error_rules.json` and its companion
//! `error_kinds.json` the first time a service is used.

use std::sync::Arc;

use application::{ApplicationError, FaultInjectionPort, FaultInjectorProvider};
use domain::ServiceName;
use tracing::{debug, info, instrument};

use crate::chaos::{FaultConfig, FaultInjector};
use crate::config::FaultInjectionAppConfig;

/// Provider that builds injectors from per-service rule files
#[derive(Debug, Clone, Default)]
pub struct FileFaultInjectorProvider {
    settings: FaultInjectionAppConfig,
}

impl FileFaultInjectorProvider {
    pub const fn new(settings: FaultInjectionAppConfig) -> Self {
        Self { settings }
    }

    pub const fn settings(&self) -> &FaultInjectionAppConfig {
        &self.settings
    }

    /// Build the concrete injector of `service`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the service's rule files are
    /// incomplete, unparsable or inconsistent.
    pub fn build(&self, service: &ServiceName) -> Result<FaultInjector, ApplicationError> {
        let injector_config = self.settings.injector_config_for(service.as_str());
        if !injector_config.enabled {
            debug!(service = %service, "Fault injection disabled by configuration");
            return Ok(FaultInjector::disabled(service.clone()));
        }

        let dir = self.settings.dir_for(service.as_str());
        match FaultConfig::load(&dir)? {
            Some(fault_config) => {
                info!(
                    service = %service,
                    dir = %dir.display(),
                    rules = fault_config.policy.rules().len(),
                    "Loaded fault configuration"
                );
                Ok(FaultInjector::from_config(
                    service.clone(),
                    fault_config,
                    injector_config,
                ))
            },
            None => Ok(FaultInjector::disabled(service.clone())),
        }
    }
}

impl FaultInjectorProvider for FileFaultInjectorProvider {
    #[instrument(skip(self), fields(service = %service))]
    fn injector_for(
        &self,
        service: &ServiceName,
    ) -> Result<Arc<dyn FaultInjectionPort>, ApplicationError> {
        Ok(Arc::new(self.build(service)?))
    }
}
