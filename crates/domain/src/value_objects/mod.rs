//! Value Objects - Immutable, identity-less domain primitives

mod identifiers;
mod implementation_path;

pub use identifiers::{MAX_IDENTIFIER_LEN, MutationName, OperationName, ServiceName};
pub use implementation_path::ImplementationPath;
