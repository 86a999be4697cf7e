//! Domain entities - Catalog entries, mutation frames, rules and reports

mod error_report;
mod error_rule;
mod mutation_frame;
mod operation_entry;

pub use error_report::{CauseEntry, ErrorReport};
pub use error_rule::{ArgumentCondition, ErrorKindSpec, ErrorRule, Trigger};
pub use mutation_frame::MutationFrame;
pub use operation_entry::OperationEntry;
