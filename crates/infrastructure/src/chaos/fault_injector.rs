//! Fault injector of one service.
//!
//! Consulted before every call of a resolved operation. Rules for the
//! operation are evaluated in declaration order and the first one that
//! triggers wins. Randomness comes from a seeded ChaCha20 stream, so runs
//! with the same seed and call sequence inject the same faults.

use application::{CallArgs, FaultInjectionPort, FaultStats};
use domain::{OperationError, OperationName, ServiceName, SharedOperationError, Trigger};
use parking_lot::Mutex;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{ChaosContext, CompiledRule, FaultConfig, FaultPolicy, InjectionResult};

/// Module name of the frame attached to injected faults
pub const FAULT_FRAME_MODULE: &str = "fault_injection";

/// Runtime settings of an injector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultInjectorConfig {
    /// Whether rules are evaluated at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// RNG seed; drawn from the thread RNG when absent
    #[serde(default)]
    pub seed: Option<u64>,
    /// Upper bound on faults across all kinds until the next reset
    #[serde(default)]
    pub max_errors_per_run: Option<u64>,
}

const fn default_enabled() -> bool {
    true
}

impl Default for FaultInjectorConfig {
    fn default() -> Self {
        Self::enabled()
    }
}

impl FaultInjectorConfig {
    pub const fn enabled() -> Self {
        Self {
            enabled: true,
            seed: None,
            max_errors_per_run: None,
        }
    }

    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            seed: None,
            max_errors_per_run: None,
        }
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_max_errors_per_run(mut self, max: u64) -> Self {
        self.max_errors_per_run = Some(max);
        self
    }
}

struct InjectorState {
    context: ChaosContext,
    rng: ChaCha20Rng,
    seed: u64,
}

/// Declarative, config-driven fault injector
pub struct FaultInjector {
    service: ServiceName,
    config: FaultInjectorConfig,
    policy: FaultPolicy,
    state: Mutex<InjectorState>,
}

impl std::fmt::Debug for FaultInjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaultInjector")
            .field("service", &self.service)
            .field("config", &self.config)
            .field("rules", &self.policy.rules().len())
            .finish_non_exhaustive()
    }
}

impl FaultInjector {
    /// Create an injector for `service`
    pub fn new(service: ServiceName, policy: FaultPolicy, config: FaultInjectorConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let context = ChaosContext::new(&policy, config.max_errors_per_run);
        debug!(
            service = %service,
            rules = policy.rules().len(),
            seed,
            "Created fault injector"
        );
        Self {
            service,
            config,
            policy,
            state: Mutex::new(InjectorState {
                context,
                rng: ChaCha20Rng::seed_from_u64(seed),
                seed,
            }),
        }
    }

    /// Create an injector from loaded configuration files
    pub fn from_config(
        service: ServiceName,
        fault_config: FaultConfig,
        config: FaultInjectorConfig,
    ) -> Self {
        Self::new(service, fault_config.policy, config)
    }

    /// Injector that never fires
    pub fn disabled(service: ServiceName) -> Self {
        Self::new(service, FaultPolicy::never(), FaultInjectorConfig::disabled())
    }

    /// Restart the random stream from `seed`
    pub fn reseed(&self, seed: u64) {
        let mut state = self.state.lock();
        state.seed = seed;
        state.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    /// Seed the random stream started from
    pub fn seed(&self) -> u64 {
        self.state.lock().seed
    }

    /// Faults left in the run budget, if limited
    pub fn remaining_faults(&self) -> Option<u64> {
        self.state.lock().context.remaining_faults()
    }

    pub const fn policy(&self) -> &FaultPolicy {
        &self.policy
    }

    pub const fn service(&self) -> &ServiceName {
        &self.service
    }

    /// Count the call and return a simulated failure if a rule triggers
    pub fn maybe_inject(&self, operation: &str, args: &CallArgs) -> Option<SharedOperationError> {
        let mut guard = self.state.lock();
        let InjectorState { context, rng, .. } = &mut *guard;
        let call = context.record_call(operation);

        if !self.is_active() {
            return None;
        }

        let mut result = InjectionResult::NoInjection;
        for compiled in self.policy.rules_for(operation) {
            let kind = compiled.rule.error_kind.as_str();
            if !context.can_inject() || context.kind_exhausted(kind, self.policy.max_occurrences(kind)) {
                result = InjectionResult::LimitReached;
                continue;
            }

            let fired = match &compiled.rule.trigger {
                Trigger::Always => true,
                Trigger::NthCall { n } => call == *n,
                Trigger::Probability { .. } => {
                    let probability = context.probability(compiled.index).unwrap_or(0.0);
                    rng.random::<f64>() < probability
                },
                Trigger::Predicate {
                    argument,
                    condition,
                } => condition.holds(args.get(argument)),
            };

            if fired {
                context.record_injection(compiled);
                let fault = self.fault_for(compiled, operation, call, args);
                warn!(
                    service = %self.service,
                    operation = %operation,
                    call,
                    trigger = compiled.rule.trigger.kind(),
                    error_kind = %kind,
                    exception_type = %fault.exception_type(),
                    "Injected fault"
                );
                return Some(fault);
            }
        }

        trace!(
            service = %self.service,
            operation = %operation,
            call,
            result = ?result,
            "No fault injected"
        );
        None
    }

    fn is_active(&self) -> bool {
        self.config.enabled && !self.policy.is_empty()
    }

    fn fault_for(
        &self,
        compiled: &CompiledRule,
        operation: &str,
        call: u64,
        args: &CallArgs,
    ) -> SharedOperationError {
        let message = if compiled.rule.message_template.is_empty() {
            compiled.default_message.clone().unwrap_or_else(|| {
                format!(
                    "Simulated {} failure in {}.{operation}",
                    compiled.rule.error_kind, self.service
                )
            })
        } else {
            compiled
                .rule
                .render_message(self.service.as_str(), call, args)
        };

        OperationError::new(compiled.exception.clone(), message)
            .at(FAULT_FRAME_MODULE, operation)
            .into_shared()
    }
}

impl FaultInjectionPort for FaultInjector {
    fn is_enabled(&self) -> bool {
        self.is_active()
    }

    fn intercept(&self, operation: &OperationName, args: &CallArgs) -> Option<SharedOperationError> {
        self.maybe_inject(operation.as_str(), args)
    }

    fn stats(&self) -> FaultStats {
        self.state
            .lock()
            .context
            .stats(self.service.as_str(), self.is_active(), &self.policy)
    }

    fn reset(&self) {
        let mut state = self.state.lock();
        state.context.reset(&self.policy);
        state.rng = ChaCha20Rng::seed_from_u64(state.seed);
        debug!(service = %self.service, "Reset fault injector");
    }
}
