//! Harness bootstrap from application configuration

use std::sync::Arc;

use application::{ApplicationError, Harness, ServiceModule};
use integration_calendar::CalendarService;
use integration_mail::MailService;
use tracing::info;

use crate::adapters::FileFaultInjectorProvider;
use crate::config::AppConfig;

/// Service modules shipped with the harness
pub fn builtin_services() -> Vec<Arc<dyn ServiceModule>> {
    vec![
        Arc::new(CalendarService::new()),
        Arc::new(MailService::new()),
    ]
}

/// Build a harness over the built-in services
///
/// # Errors
///
/// Returns a configuration error if validation fails, the service tables
/// are inconsistent, or a configured mutation does not exist.
pub fn build_harness(config: &AppConfig) -> Result<Harness, ApplicationError> {
    build_harness_with(config, builtin_services())
}

/// Build a harness over `services`, applying fault settings, error mode
/// and startup mutations from `config`
///
/// # Errors
///
/// See [`build_harness`].
pub fn build_harness_with(
    config: &AppConfig,
    services: Vec<Arc<dyn ServiceModule>>,
) -> Result<Harness, ApplicationError> {
    config.validate()?;

    let provider = FileFaultInjectorProvider::new(config.fault_injection.clone());
    let harness = services
        .into_iter()
        .fold(Harness::builder(), |builder, service| builder.service(service))
        .fault_injector_provider(Arc::new(provider))
        .error_mode(config.error_mode())
        .log_reports(config.error_reporting.log_reports)
        .build()?;

    for (service, mutation) in &config.mutations {
        harness.activate(service, mutation)?;
        info!(service = %service, mutation = %mutation, "Activated configured mutation");
    }

    Ok(harness)
}
