//! Domain layer for SimHarness
//!
//! Contains the vocabulary of the capability registry: service, operation
//! and mutation names, catalog entries, mutation frames, fault rules,
//! chained operation errors and structured error reports.
//! This layer has no knowledge of files, environment or logging.

pub mod entities;
pub mod errors;
pub mod operation_error;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use operation_error::{Frame, OperationError, SharedOperationError};
pub use value_objects::*;
