//! Chaos context: mutable fault injection state of one service.
//!
//! Call counters are keyed by operation name only. They are shared across
//! mutation activations, survive reverts, and start at 1 for the first call.

use std::collections::BTreeMap;

use application::{FaultStats, RuleProbability};

use super::{CompiledRule, FaultPolicy};

/// Outcome of evaluating the rules for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionResult {
    /// No rule triggered
    NoInjection,
    /// A rule triggered and a fault was injected
    Injected,
    /// A rule would have been considered but its kind or the run budget is exhausted
    LimitReached,
}

/// Counters, budgets and dampened probabilities
#[derive(Debug, Clone, Default)]
pub struct ChaosContext {
    total_calls: u64,
    faults_injected: u64,
    calls_per_operation: BTreeMap<String, u64>,
    injected_per_kind: BTreeMap<String, u64>,
    /// Current probability per rule index
    probabilities: BTreeMap<usize, f64>,
    max_errors_per_run: Option<u64>,
}

impl ChaosContext {
    /// Fresh state for `policy`
    pub fn new(policy: &FaultPolicy, max_errors_per_run: Option<u64>) -> Self {
        Self {
            probabilities: initial_probabilities(policy),
            max_errors_per_run,
            ..Self::default()
        }
    }

    /// Count a call, returning its 1-based number for `operation`
    pub fn record_call(&mut self, operation: &str) -> u64 {
        self.total_calls += 1;
        let count = self
            .calls_per_operation
            .entry(operation.to_string())
            .or_insert(0);
        *count += 1;
        *count
    }

    pub fn call_count(&self, operation: &str) -> u64 {
        self.calls_per_operation.get(operation).copied().unwrap_or(0)
    }

    /// Whether the run budget allows another fault
    pub fn can_inject(&self) -> bool {
        self.max_errors_per_run
            .is_none_or(|max| self.faults_injected < max)
    }

    /// Whether `kind` reached its cap
    pub fn kind_exhausted(&self, kind: &str, cap: Option<u64>) -> bool {
        cap.is_some_and(|max| self.injected_for(kind) >= max)
    }

    pub fn injected_for(&self, kind: &str) -> u64 {
        self.injected_per_kind.get(kind).copied().unwrap_or(0)
    }

    /// Current probability of the rule at `index`
    pub fn probability(&self, index: usize) -> Option<f64> {
        self.probabilities.get(&index).copied()
    }

    /// Record that `rule` fired, dampening its probability
    pub fn record_injection(&mut self, rule: &CompiledRule) {
        self.faults_injected += 1;
        *self
            .injected_per_kind
            .entry(rule.rule.error_kind.clone())
            .or_insert(0) += 1;

        if let Some(dampen) = rule.dampen_factor()
            && let Some(current) = self.probabilities.get_mut(&rule.index)
        {
            *current *= 1.0 - dampen;
        }
    }

    /// Faults left in the run budget, if limited
    pub fn remaining_faults(&self) -> Option<u64> {
        self.max_errors_per_run
            .map(|max| max.saturating_sub(self.faults_injected))
    }

    pub const fn total_calls(&self) -> u64 {
        self.total_calls
    }

    pub const fn faults_injected(&self) -> u64 {
        self.faults_injected
    }

    /// Injected faults per call
    #[allow(clippy::cast_precision_loss)]
    pub fn actual_fault_rate(&self) -> f64 {
        if self.total_calls == 0 {
            0.0
        } else {
            self.faults_injected as f64 / self.total_calls as f64
        }
    }

    /// Drop counters and restore initial probabilities
    pub fn reset(&mut self, policy: &FaultPolicy) {
        *self = Self::new(policy, self.max_errors_per_run);
    }

    /// Snapshot for debugging
    pub fn stats(&self, service: &str, enabled: bool, policy: &FaultPolicy) -> FaultStats {
        let rule_probabilities = policy
            .rules()
            .iter()
            .filter_map(|compiled| {
                let initial = compiled.initial_probability()?;
                Some(RuleProbability {
                    operation: compiled.rule.operation_name.to_string(),
                    error_kind: compiled.rule.error_kind.clone(),
                    initial,
                    current: self.probability(compiled.index).unwrap_or(initial),
                })
            })
            .collect();

        FaultStats {
            service: service.to_string(),
            enabled,
            total_calls: self.total_calls,
            faults_injected: self.faults_injected,
            max_errors_per_run: self.max_errors_per_run,
            calls_per_operation: self.calls_per_operation.clone(),
            injected_per_kind: self.injected_per_kind.clone(),
            rule_probabilities,
        }
    }
}

fn initial_probabilities(policy: &FaultPolicy) -> BTreeMap<usize, f64> {
    policy
        .rules()
        .iter()
        .filter_map(|compiled| Some((compiled.index, compiled.initial_probability()?)))
        .collect()
}
