//! Capability resolver
//!
//! [`Harness`] is the context object test code and tools hold. It owns the
//! catalog, the implementation registry, the mutation library and overlay,
//! and the per-service fault injectors. Resolving an operation goes:
//!
//! 1. topmost mutation frame of the service, else the base catalog
//! 2. implementation registry lookup of the resulting path
//! 3. fault injector wrapper of the service (built once, on first use)
//! 4. error reporting policy around the whole call
//!
//! [`Harness::resolve`] snapshots the path active right now;
//! [`OperationHandle`] re-resolves on every call so it observes mutations
//! activated or reverted in between.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use domain::{
    Frame, ImplementationPath, MutationName, OperationName, ServiceName, SharedOperationError,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::error::ApplicationError;
use crate::operation::{CallArgs, CallOutcome, Operation};
use crate::ports::{
    FaultInjectionPort, FaultInjectorProvider, FaultStats, NoFaultInjectionProvider,
    ServiceModule, with_faults,
};
use crate::services::{
    ErrorMode, ErrorReporter, ImplementationRegistry, MutationLibrary, MutationOverlay,
    OperationCatalog, current_mode,
};

/// Failure of [`Harness::call`]
#[derive(Debug, Error)]
pub enum CallError {
    /// The operation could not be resolved
    #[error(transparent)]
    Resolution(#[from] ApplicationError),

    /// The operation raised (raise mode only); this is the original error
    #[error(transparent)]
    Raised(SharedOperationError),
}

impl CallError {
    /// The raised operation error, if any
    pub const fn raised(&self) -> Option<&SharedOperationError> {
        match self {
            Self::Raised(err) => Some(err),
            Self::Resolution(_) => None,
        }
    }
}

/// An operation bound to the implementation active when it was resolved
#[derive(Clone)]
pub struct ResolvedOperation {
    service: ServiceName,
    operation: OperationName,
    path: ImplementationPath,
    mutation: Option<MutationName>,
    callable: Operation,
    reporter: ErrorReporter,
}

impl ResolvedOperation {
    /// Invoke with keyword arguments
    ///
    /// # Errors
    ///
    /// In raise mode, returns the original error the call produced.
    pub fn call(&self, args: &CallArgs) -> Result<CallOutcome, SharedOperationError> {
        let origin = Frame::new(self.service.as_str(), self.operation.as_str());
        self.reporter.settle((self.callable)(args), &origin)
    }

    pub const fn service(&self) -> &ServiceName {
        &self.service
    }

    pub const fn operation(&self) -> &OperationName {
        &self.operation
    }

    pub const fn implementation_path(&self) -> &ImplementationPath {
        &self.path
    }

    /// Mutation active for the service at resolution time
    pub const fn mutation(&self) -> Option<&MutationName> {
        self.mutation.as_ref()
    }
}

impl fmt::Debug for ResolvedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedOperation")
            .field("service", &self.service)
            .field("operation", &self.operation)
            .field("path", &self.path)
            .field("mutation", &self.mutation)
            .field("mode", &self.reporter.mode())
            .finish_non_exhaustive()
    }
}

/// Late-bound accessor for one operation
#[derive(Clone, Debug)]
pub struct OperationHandle {
    harness: Harness,
    service: String,
    operation: String,
}

impl OperationHandle {
    /// Resolve against the current overlay and invoke
    ///
    /// # Errors
    ///
    /// Returns `Resolution` if the operation no longer resolves (e.g. it was
    /// added by a since-reverted mutation), `Raised` if it raised in raise
    /// mode.
    pub fn call(&self, args: &CallArgs) -> Result<CallOutcome, CallError> {
        self.harness.call(&self.service, &self.operation, args)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

struct HarnessInner {
    modules: BTreeMap<ServiceName, Arc<dyn ServiceModule>>,
    catalog: OperationCatalog,
    registry: ImplementationRegistry,
    library: MutationLibrary,
    overlay: RwLock<MutationOverlay>,
    provider: Arc<dyn FaultInjectorProvider>,
    injectors: Mutex<HashMap<ServiceName, Arc<dyn FaultInjectionPort>>>,
    reporter: ErrorReporter,
}

/// Capability registry with mutation overlays and fault injection
#[derive(Clone)]
pub struct Harness {
    inner: Arc<HarnessInner>,
}

impl fmt::Debug for Harness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Harness")
            .field("services", &self.inner.modules.keys().collect::<Vec<_>>())
            .field("implementations", &self.inner.registry.len())
            .field("mode", &self.inner.reporter.mode())
            .finish_non_exhaustive()
    }
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder::default()
    }

    /// Resolve `operation` of `service` as of now
    ///
    /// # Errors
    ///
    /// Returns a resolution error for unknown names, or a configuration
    /// error if the service's fault configuration is malformed.
    #[instrument(skip(self), level = "debug")]
    pub fn resolve(
        &self,
        service: &str,
        operation: &str,
    ) -> Result<ResolvedOperation, ApplicationError> {
        let service_name = self.service_name(service)?;

        let (path, mutation) = {
            let overlay = self.inner.overlay.read();
            let path = overlay
                .resolve_path(service, operation, &self.inner.catalog)?
                .clone();
            (path, overlay.current_mutation_name(service).cloned())
        };

        let implementation = self
            .inner
            .registry
            .get(&path)
            .ok_or_else(|| ApplicationError::MissingImplementation(path.to_string()))?;
        let operation_name = OperationName::new(operation)?;
        let injector = self.injector(&service_name)?;

        debug!(
            service = %service_name,
            operation = %operation_name,
            path = %path,
            "Resolved operation"
        );

        Ok(ResolvedOperation {
            callable: with_faults(injector, operation_name.clone(), implementation),
            service: service_name,
            operation: operation_name,
            path,
            mutation,
            reporter: self.inner.reporter,
        })
    }

    /// Accessor that re-resolves on every call
    ///
    /// # Errors
    ///
    /// Returns a resolution error if the operation does not resolve now.
    pub fn get_operation(
        &self,
        service: &str,
        operation: &str,
    ) -> Result<OperationHandle, ApplicationError> {
        self.resolve(service, operation)?;
        Ok(OperationHandle {
            harness: self.clone(),
            service: service.to_string(),
            operation: operation.to_string(),
        })
    }

    /// Resolve and invoke in one step
    ///
    /// # Errors
    ///
    /// See [`OperationHandle::call`].
    pub fn call(
        &self,
        service: &str,
        operation: &str,
        args: &CallArgs,
    ) -> Result<CallOutcome, CallError> {
        let resolved = self.resolve(service, operation)?;
        resolved.call(args).map_err(CallError::Raised)
    }

    /// Base operations of `service` plus those added by its active mutation
    ///
    /// # Errors
    ///
    /// Returns `UnknownService`.
    pub fn list_operations(&self, service: &str) -> Result<BTreeSet<OperationName>, ApplicationError> {
        self.inner
            .overlay
            .read()
            .operation_names(service, &self.inner.catalog)
    }

    /// Push a mutation for `service`
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` or `UnknownMutation`; state is unchanged.
    pub fn activate(&self, service: &str, mutation: &str) -> Result<(), ApplicationError> {
        let service_name = self.service_name(service)?;
        self.inner
            .overlay
            .write()
            .activate(&self.inner.library, &service_name, mutation)?;
        Ok(())
    }

    /// Name of the topmost active mutation of `service`
    pub fn current_mutation_name(&self, service: &str) -> Option<MutationName> {
        self.inner.overlay.read().current_mutation_name(service).cloned()
    }

    /// Pop the topmost mutation of `service`, returning its name
    ///
    /// # Errors
    ///
    /// Returns `UnknownService`, or `NoActiveMutation` if nothing is active.
    pub fn revert(&self, service: &str) -> Result<MutationName, ApplicationError> {
        self.service_name(service)?;
        let frame = self.inner.overlay.write().revert(service)?;
        Ok(frame.mutation_name)
    }

    /// Pop every mutation of `service`
    pub fn revert_all(&self, service: &str) -> usize {
        self.inner.overlay.write().revert_all(service)
    }

    /// Active mutation stacks, bottom first
    pub fn active_mutations(&self) -> BTreeMap<ServiceName, Vec<MutationName>> {
        self.inner.overlay.read().active_mutations()
    }

    /// Mutations `service` ships
    pub fn mutation_names(&self, service: &str) -> Vec<MutationName> {
        self.inner
            .library
            .mutation_names(service)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Registered services, sorted
    pub fn services(&self) -> Vec<ServiceName> {
        self.inner.modules.keys().cloned().collect()
    }

    /// The module behind `service`
    ///
    /// # Errors
    ///
    /// Returns `UnknownService`.
    pub fn module(&self, service: &str) -> Result<Arc<dyn ServiceModule>, ApplicationError> {
        self.inner
            .modules
            .get(service)
            .cloned()
            .ok_or_else(|| ApplicationError::UnknownService(service.to_string()))
    }

    /// Load the fixture store of `service` from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` or the module's load error.
    pub fn load_state(&self, service: &str, path: &Path) -> Result<(), ApplicationError> {
        self.module(service)?.load_state(path)
    }

    /// Save the fixture store of `service` to a JSON file
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` or the module's save error.
    pub fn save_state(&self, service: &str, path: &Path) -> Result<(), ApplicationError> {
        self.module(service)?.save_state(path)
    }

    /// Agent-visible snapshot of `service`
    ///
    /// # Errors
    ///
    /// Returns `UnknownService`.
    pub fn minified_state(&self, service: &str) -> Result<Value, ApplicationError> {
        Ok(self.module(service)?.minified_state())
    }

    /// Debug snapshot of the fault injector of `service`
    ///
    /// # Errors
    ///
    /// Returns `UnknownService` or a fault configuration error.
    pub fn fault_stats(&self, service: &str) -> Result<FaultStats, ApplicationError> {
        let service_name = self.service_name(service)?;
        Ok(self.injector(&service_name)?.stats())
    }

    /// Reset counters of every injector built so far
    pub fn reset_faults(&self) {
        let injectors = self.inner.injectors.lock();
        for injector in injectors.values() {
            injector.reset();
        }
        info!(injectors = injectors.len(), "Reset fault injectors");
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.inner.reporter.mode()
    }

    fn service_name(&self, service: &str) -> Result<ServiceName, ApplicationError> {
        self.inner
            .modules
            .get_key_value(service)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| ApplicationError::UnknownService(service.to_string()))
    }

    fn injector(
        &self,
        service: &ServiceName,
    ) -> Result<Arc<dyn FaultInjectionPort>, ApplicationError> {
        let mut injectors = self.inner.injectors.lock();
        if let Some(injector) = injectors.get(service) {
            return Ok(Arc::clone(injector));
        }

        let injector = self.inner.provider.injector_for(service)?;
        info!(
            service = %service,
            enabled = injector.is_enabled(),
            "Fault injector ready"
        );
        injectors.insert(service.clone(), Arc::clone(&injector));
        Ok(injector)
    }
}

/// Builder for [`Harness`]
pub struct HarnessBuilder {
    modules: Vec<Arc<dyn ServiceModule>>,
    provider: Option<Arc<dyn FaultInjectorProvider>>,
    mode: Option<ErrorMode>,
    log_reports: bool,
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self {
            modules: Vec::new(),
            provider: None,
            mode: None,
            log_reports: true,
        }
    }
}

impl fmt::Debug for HarnessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HarnessBuilder")
            .field(
                "modules",
                &self.modules.iter().map(|m| m.name()).collect::<Vec<_>>(),
            )
            .field("custom_provider", &self.provider.is_some())
            .field("mode", &self.mode)
            .field("log_reports", &self.log_reports)
            .finish()
    }
}

impl HarnessBuilder {
    /// Register a service module
    #[must_use]
    pub fn service(mut self, module: Arc<dyn ServiceModule>) -> Self {
        self.modules.push(module);
        self
    }

    /// Source of per-service fault injectors (default: none)
    #[must_use]
    pub fn fault_injector_provider(mut self, provider: Arc<dyn FaultInjectorProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Error reporting mode (default: the process mode)
    #[must_use]
    pub const fn error_mode(mut self, mode: ErrorMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Log a report for every error raised in raise mode (default: on)
    #[must_use]
    pub const fn log_reports(mut self, enabled: bool) -> Self {
        self.log_reports = enabled;
        self
    }

    /// Register every module and validate the tables
    ///
    /// # Errors
    ///
    /// Returns a configuration error on a malformed table entry, on
    /// duplicate services, operations, mutations or implementations, or on
    /// a table entry whose implementation was never registered.
    pub fn build(self) -> Result<Harness, ApplicationError> {
        let mut registry = ImplementationRegistry::new();
        let mut catalog = OperationCatalog::builder();
        let mut library = MutationLibrary::new();
        let mut modules = BTreeMap::new();

        for module in self.modules {
            let name = module.name();
            if modules.contains_key(&name) {
                return Err(ApplicationError::Configuration(format!(
                    "service '{name}' registered twice"
                )));
            }
            module.register(&mut registry)?;
            catalog = catalog.service(name.clone(), module.operations()?);
            for definition in module.mutations()? {
                library.add(&name, definition)?;
            }
            modules.insert(name, module);
        }
        let catalog = catalog.build()?;

        for (service, path) in catalog.implementation_paths() {
            if !registry.contains(path) {
                return Err(ApplicationError::MissingImplementation(format!(
                    "{path} (catalog of '{service}')"
                )));
            }
        }
        for (service, mutation, path) in library.implementation_paths() {
            if !registry.contains(path) {
                return Err(ApplicationError::MissingImplementation(format!(
                    "{path} (mutation '{mutation}' of '{service}')"
                )));
            }
        }

        let mode = self.mode.unwrap_or_else(current_mode);
        info!(
            services = modules.len(),
            implementations = registry.len(),
            mode = %mode,
            "Harness ready"
        );

        Ok(Harness {
            inner: Arc::new(HarnessInner {
                modules,
                catalog,
                registry,
                library,
                overlay: RwLock::new(MutationOverlay::new()),
                provider: self
                    .provider
                    .unwrap_or_else(|| Arc::new(NoFaultInjectionProvider)),
                injectors: Mutex::new(HashMap::new()),
                reporter: ErrorReporter::new(mode, self.log_reports),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{
        MockFaultInjectionPort, MockFaultInjectorProvider, MockServiceModule, NoFaultInjection,
    };
    use crate::services::MutationDefinition;
    use domain::{OperationEntry, OperationError};
    use serde_json::json;
    use tracing_test::traced_test;

    struct StubService {
        name: &'static str,
    }

    impl ServiceModule for StubService {
        fn name(&self) -> ServiceName {
            ServiceName::new(self.name).unwrap()
        }

        fn operations(&self) -> Result<Vec<OperationEntry>, ApplicationError> {
            Ok(vec![
                OperationEntry::parse("greet", &format!("{}.base.greet", self.name))?,
                OperationEntry::parse("fail", &format!("{}.base.fail", self.name))?,
            ])
        }

        fn mutations(&self) -> Result<Vec<MutationDefinition>, ApplicationError> {
            let loud_greet = format!("{}.loud.greet", self.name);
            let loud_shout = format!("{}.loud.shout", self.name);
            let quiet_greet = format!("{}.quiet.greet", self.name);
            Ok(vec![
                MutationDefinition::parse(
                    "loud",
                    &[("greet", loud_greet.as_str()), ("shout", loud_shout.as_str())],
                )?,
                MutationDefinition::parse("quiet", &[("greet", quiet_greet.as_str())])?,
            ])
        }

        fn register(&self, registry: &mut ImplementationRegistry) -> Result<(), ApplicationError> {
            let name = self.name;
            registry.register_fn(&format!("{name}.base.greet"), |_| Ok(json!("hello")))?;
            registry.register_fn(&format!("{name}.base.fail"), |_| {
                Err(OperationError::value_error("x").at("stub.base", "fail").into_shared())
            })?;
            registry.register_fn(&format!("{name}.loud.greet"), |_| Ok(json!("HELLO")))?;
            registry.register_fn(&format!("{name}.loud.shout"), |_| Ok(json!("HEY")))?;
            registry.register_fn(&format!("{name}.quiet.greet"), |_| Ok(json!("hi")))?;
            Ok(())
        }

        fn load_state(&self, _path: &Path) -> Result<(), ApplicationError> {
            Ok(())
        }

        fn save_state(&self, _path: &Path) -> Result<(), ApplicationError> {
            Ok(())
        }

        fn minified_state(&self) -> Value {
            json!({ "service": self.name })
        }
    }

    fn harness(mode: ErrorMode) -> Harness {
        Harness::builder()
            .service(Arc::new(StubService { name: "alpha" }))
            .service(Arc::new(StubService { name: "beta" }))
            .error_mode(mode)
            .build()
            .unwrap()
    }

    fn greet(h: &Harness, service: &str) -> Value {
        h.call(service, "greet", &CallArgs::new())
            .unwrap()
            .value()
            .cloned()
            .unwrap()
    }

    #[test]
    fn resolves_base_catalog_without_mutation() {
        let h = harness(ErrorMode::Raise);
        let resolved = h.resolve("alpha", "greet").unwrap();
        assert_eq!(resolved.implementation_path().as_str(), "alpha.base.greet");
        assert!(resolved.mutation().is_none());
        assert_eq!(greet(&h, "alpha"), json!("hello"));
    }

    #[test]
    fn activation_and_lifo_revert() {
        let h = harness(ErrorMode::Raise);
        h.activate("alpha", "loud").unwrap();
        h.activate("alpha", "quiet").unwrap();
        assert_eq!(h.current_mutation_name("alpha").unwrap().as_str(), "quiet");
        assert_eq!(greet(&h, "alpha"), json!("hi"));

        assert_eq!(h.revert("alpha").unwrap().as_str(), "quiet");
        assert_eq!(greet(&h, "alpha"), json!("HELLO"));
        assert_eq!(h.revert("alpha").unwrap().as_str(), "loud");
        assert_eq!(greet(&h, "alpha"), json!("hello"));
        assert!(h.current_mutation_name("alpha").is_none());
    }

    #[test]
    fn revert_without_mutation_is_error() {
        let h = harness(ErrorMode::Raise);
        let err = h.revert("alpha").unwrap_err();
        assert!(matches!(err, ApplicationError::NoActiveMutation(_)));
        assert!(h.current_mutation_name("alpha").is_none());
    }

    #[test]
    fn mutations_do_not_leak_across_services() {
        let h = harness(ErrorMode::Raise);
        h.activate("alpha", "loud").unwrap();
        assert_eq!(greet(&h, "beta"), json!("hello"));
        assert!(h.current_mutation_name("beta").is_none());
    }

    #[test]
    fn unknown_names_are_resolution_errors() {
        let h = harness(ErrorMode::Raise);
        assert!(h.resolve("gamma", "greet").unwrap_err().is_resolution_error());
        assert!(h.resolve("alpha", "shout").unwrap_err().is_resolution_error());
        assert!(h.activate("alpha", "silent").unwrap_err().is_configuration_error());
        assert!(h.activate("gamma", "loud").unwrap_err().is_resolution_error());
    }

    #[test]
    fn handle_observes_overlay_changes() {
        let h = harness(ErrorMode::Raise);
        let handle = h.get_operation("alpha", "greet").unwrap();
        let snapshot = h.resolve("alpha", "greet").unwrap();

        h.activate("alpha", "loud").unwrap();
        let via_handle = handle.call(&CallArgs::new()).unwrap();
        assert_eq!(via_handle.value(), Some(&json!("HELLO")));

        let via_snapshot = snapshot.call(&CallArgs::new()).unwrap();
        assert_eq!(via_snapshot.value(), Some(&json!("hello")));
    }

    #[test]
    fn list_operations_unions_mutation_additions() {
        let h = harness(ErrorMode::Raise);
        let names = |h: &Harness| -> Vec<String> {
            h.list_operations("alpha")
                .unwrap()
                .into_iter()
                .map(OperationName::into_inner)
                .collect()
        };
        assert_eq!(names(&h), vec!["fail", "greet"]);
        h.activate("alpha", "loud").unwrap();
        assert_eq!(names(&h), vec!["fail", "greet", "shout"]);
        h.revert("alpha").unwrap();
        assert!(h.call("alpha", "shout", &CallArgs::new()).is_err());
    }

    #[test]
    fn structured_mode_returns_report() {
        let h = harness(ErrorMode::Structured);
        let outcome = h.call("alpha", "fail", &CallArgs::new()).unwrap();
        let report = outcome.report().unwrap();
        assert!(report.exception_type.contains("ValueError"));
        assert_eq!(report.message, "x");
        assert_eq!(report.module, "alpha");
        assert_eq!(report.function, "fail");
    }

    #[test]
    fn raise_mode_propagates_original_error() {
        let h = harness(ErrorMode::Raise);
        let err = h.call("alpha", "fail", &CallArgs::new()).unwrap_err();
        let raised = err.raised().unwrap();
        assert_eq!(raised.exception_type(), "ValueError");
        assert_eq!(raised.message(), "x");
    }

    #[test]
    fn missing_implementation_fails_build() {
        struct Broken;
        impl ServiceModule for Broken {
            fn name(&self) -> ServiceName {
                ServiceName::new("broken").unwrap()
            }
            fn operations(&self) -> Result<Vec<OperationEntry>, ApplicationError> {
                Ok(vec![OperationEntry::parse("op", "broken.nowhere")?])
            }
            fn mutations(&self) -> Result<Vec<MutationDefinition>, ApplicationError> {
                Ok(Vec::new())
            }
            fn register(&self, _: &mut ImplementationRegistry) -> Result<(), ApplicationError> {
                Ok(())
            }
            fn load_state(&self, _: &Path) -> Result<(), ApplicationError> {
                Ok(())
            }
            fn save_state(&self, _: &Path) -> Result<(), ApplicationError> {
                Ok(())
            }
            fn minified_state(&self) -> Value {
                Value::Null
            }
        }

        let err = Harness::builder()
            .service(Arc::new(Broken))
            .build()
            .unwrap_err();
        assert!(matches!(err, ApplicationError::MissingImplementation(_)));
    }

    #[test]
    fn malformed_mutation_entry_fails_build() {
        let mut module = MockServiceModule::new();
        module
            .expect_name()
            .return_const(ServiceName::from_static("calendar"));
        module.expect_register().returning(|_| Ok(()));
        module.expect_operations().returning(|| Ok(Vec::new()));
        module.expect_mutations().returning(|| {
            let definition = MutationDefinition::parse(
                "read_only",
                &[("bad op", "calendar.read_only.reject_write")],
            )?;
            Ok(vec![definition])
        });

        let err = Harness::builder()
            .service(Arc::new(module))
            .build()
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn malformed_operation_entry_fails_build() {
        let mut module = MockServiceModule::new();
        module
            .expect_name()
            .return_const(ServiceName::from_static("calendar"));
        module.expect_register().returning(|_| Ok(()));
        module
            .expect_operations()
            .returning(|| Ok(vec![OperationEntry::parse("free busy", "calendar.events.list")?]));
        module.expect_mutations().never();

        let err = Harness::builder()
            .service(Arc::new(module))
            .build()
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[traced_test]
    #[test]
    fn raise_mode_logs_report_by_default() {
        let h = Harness::builder()
            .service(Arc::new(StubService { name: "alpha" }))
            .error_mode(ErrorMode::Raise)
            .build()
            .unwrap();
        assert!(h.inner.reporter.log_reports());

        assert!(h.call("alpha", "fail", &CallArgs::new()).is_err());
        assert!(logs_contain("Operation raised"));
        assert!(logs_contain("ValueError"));
    }

    #[traced_test]
    #[test]
    fn raise_mode_report_can_be_silenced() {
        let h = Harness::builder()
            .service(Arc::new(StubService { name: "alpha" }))
            .error_mode(ErrorMode::Raise)
            .log_reports(false)
            .build()
            .unwrap();

        assert!(h.call("alpha", "fail", &CallArgs::new()).is_err());
        assert!(!logs_contain("Operation raised"));
    }

    #[test]
    fn builder_debug_lists_modules() {
        let builder = Harness::builder()
            .service(Arc::new(StubService { name: "alpha" }))
            .service(Arc::new(StubService { name: "beta" }));
        let debug = format!("{builder:?}");
        assert!(debug.contains("alpha"));
        assert!(debug.contains("beta"));
        assert!(debug.contains("log_reports: true"));
    }

    #[test]
    fn duplicate_service_fails_build() {
        let err = Harness::builder()
            .service(Arc::new(StubService { name: "alpha" }))
            .service(Arc::new(StubService { name: "alpha" }))
            .build()
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn injector_is_built_once_and_can_fault() {
        let mut provider = MockFaultInjectorProvider::new();
        provider.expect_injector_for().times(1).returning(|_| {
            let mut injector = MockFaultInjectionPort::new();
            injector.expect_is_enabled().return_const(true);
            injector.expect_intercept().returning(|op, _| {
                (op.as_str() == "greet").then(|| {
                    OperationError::new("ConnectionError", "down")
                        .at("fault_injection", "greet")
                        .into_shared()
                })
            });
            Ok(Arc::new(injector) as Arc<dyn FaultInjectionPort>)
        });

        let h = Harness::builder()
            .service(Arc::new(StubService { name: "alpha" }))
            .fault_injector_provider(Arc::new(provider))
            .error_mode(ErrorMode::Structured)
            .build()
            .unwrap();

        for _ in 0..3 {
            let outcome = h.call("alpha", "greet", &CallArgs::new()).unwrap();
            assert_eq!(outcome.report().unwrap().exception_type, "ConnectionError");
        }
        let outcome = h.call("alpha", "fail", &CallArgs::new()).unwrap();
        assert_eq!(outcome.report().unwrap().exception_type, "ValueError");
    }

    #[test]
    fn malformed_fault_config_surfaces_on_first_use() {
        let mut provider = MockFaultInjectorProvider::new();
        provider
            .expect_injector_for()
            .returning(|_| Err(ApplicationError::Configuration("bad rules".into())));

        let h = Harness::builder()
            .service(Arc::new(StubService { name: "alpha" }))
            .fault_injector_provider(Arc::new(provider))
            .build()
            .unwrap();

        let err = h.call("alpha", "greet", &CallArgs::new()).unwrap_err();
        assert!(matches!(
            err,
            CallError::Resolution(ApplicationError::Configuration(_))
        ));
    }

    #[test]
    fn fault_stats_and_reset_reach_injector() {
        let mut provider = MockFaultInjectorProvider::new();
        provider.expect_injector_for().times(1).returning(|service| {
            let mut injector = MockFaultInjectionPort::new();
            let stats = NoFaultInjection::new(service.as_str()).stats();
            injector.expect_is_enabled().return_const(false);
            injector.expect_stats().return_const(stats);
            injector.expect_reset().times(1).return_const(());
            Ok(Arc::new(injector) as Arc<dyn FaultInjectionPort>)
        });

        let h = Harness::builder()
            .service(Arc::new(StubService { name: "alpha" }))
            .fault_injector_provider(Arc::new(provider))
            .build()
            .unwrap();

        assert_eq!(h.fault_stats("alpha").unwrap().service, "alpha");
        h.reset_faults();
    }

    #[test]
    fn state_hooks_delegate_to_module() {
        let h = harness(ErrorMode::Raise);
        assert_eq!(h.minified_state("beta").unwrap(), json!({ "service": "beta" }));
        assert!(h.minified_state("gamma").is_err());
        assert_eq!(h.services().len(), 2);
        assert_eq!(h.mutation_names("alpha").len(), 2);
    }
}
