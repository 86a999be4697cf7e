//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer and the service
//! integration crates implement these ports.

mod fault_injection_port;
mod service_module;

#[cfg(test)]
pub use fault_injection_port::{MockFaultInjectionPort, MockFaultInjectorProvider};
pub use fault_injection_port::{
    FaultInjectionPort, FaultInjectorProvider, FaultStats, NoFaultInjection,
    NoFaultInjectionProvider, RuleProbability, with_faults,
};
#[cfg(test)]
pub use service_module::MockServiceModule;
pub use service_module::ServiceModule;
