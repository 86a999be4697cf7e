//! Application layer - Capability resolution and orchestration
//!
//! Contains the operation catalog, implementation registry, mutation
//! overlay, error reporting policy and the [`Harness`] that resolves
//! operations through all of them. Defines the ports implemented by
//! service modules and fault injectors.

pub mod error;
pub mod operation;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use operation::{CallArgs, CallOutcome, Operation, OperationResult, operation};
pub use ports::*;
pub use services::*;
