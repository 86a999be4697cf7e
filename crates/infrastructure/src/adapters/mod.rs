//! Infrastructure adapters
//!
//! Adapters connect application ports to concrete implementations.

mod file_fault_injector_provider;

pub use file_fault_injector_provider::FileFaultInjectorProvider;
