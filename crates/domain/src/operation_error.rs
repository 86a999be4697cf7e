//! Chained operation errors
//!
//! `OperationError` is the failure value every simulated operation raises,
//! whether it comes from business logic or from fault injection. Errors are
//! shared behind `Arc` so the same object can travel through wrappers and
//! be compared by identity, and they carry two mutable links:
//!
//! - `cause`: the error this one was explicitly raised from
//! - `context`: the error that was being handled when this one occurred
//!
//! Links are settable after construction, so chains may legally contain
//! cycles (an error can even be its own cause). Use [`OperationError::chain`]
//! to walk them safely.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Shared handle to an operation error
pub type SharedOperationError = Arc<OperationError>;

/// One entry of an error's traceback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Module (or service) the frame belongs to
    pub module: String,
    /// Function (or operation) name
    pub function: String,
}

impl Frame {
    /// Create a new frame
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            function: function.into(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File \"{}\", in {}", self.module, self.function)
    }
}

/// A failure raised by a simulated operation
pub struct OperationError {
    exception_type: String,
    message: String,
    /// Outermost first, deepest last
    frames: Vec<Frame>,
    cause: RwLock<Option<SharedOperationError>>,
    context: RwLock<Option<SharedOperationError>>,
}

impl OperationError {
    /// Create a new error of the given exception type
    pub fn new(exception_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            exception_type: exception_type.into(),
            message: message.into(),
            frames: Vec::new(),
            cause: RwLock::new(None),
            context: RwLock::new(None),
        }
    }

    /// Shorthand for a `ValueError`
    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new("ValueError", message)
    }

    /// Shorthand for a `KeyError`
    pub fn key_error(message: impl Into<String>) -> Self {
        Self::new("KeyError", message)
    }

    /// Append a frame deeper than all existing ones
    #[must_use]
    pub fn at(mut self, module: impl Into<String>, function: impl Into<String>) -> Self {
        self.frames.push(Frame::new(module, function));
        self
    }

    /// Set the explicit cause
    #[must_use]
    pub fn caused_by(self, cause: SharedOperationError) -> Self {
        *self.cause.write() = Some(cause);
        self
    }

    /// Set the implicit context
    #[must_use]
    pub fn during(self, context: SharedOperationError) -> Self {
        *self.context.write() = Some(context);
        self
    }

    /// Wrap in an `Arc`
    pub fn into_shared(self) -> SharedOperationError {
        Arc::new(self)
    }

    /// Convert any standard error, turning its `source()` chain into causes
    pub fn from_std(
        exception_type: impl Into<String>,
        error: &(dyn std::error::Error + 'static),
    ) -> Self {
        let mut sources = Vec::new();
        let mut next = error.source();
        while let Some(source) = next {
            sources.push(source.to_string());
            next = source.source();
        }

        let root = sources
            .into_iter()
            .rev()
            .fold(None::<SharedOperationError>, |inner, message| {
                let link = Self::new("Error", message);
                Some(match inner {
                    Some(inner) => link.caused_by(inner).into_shared(),
                    None => link.into_shared(),
                })
            });

        let top = Self::new(exception_type, error.to_string());
        match root {
            Some(root) => top.caused_by(root),
            None => top,
        }
    }

    /// Exception type name (e.g. `ValueError`)
    pub fn exception_type(&self) -> &str {
        &self.exception_type
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Traceback frames, outermost first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// The frame where the error originated
    pub fn deepest_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Current explicit cause
    pub fn cause(&self) -> Option<SharedOperationError> {
        self.cause.read().clone()
    }

    /// Current implicit context
    pub fn context(&self) -> Option<SharedOperationError> {
        self.context.read().clone()
    }

    /// Replace the explicit cause after construction
    ///
    /// Linking an error to itself (or to an ancestor) creates a reference
    /// cycle that is only released by clearing the link again.
    pub fn set_cause(&self, cause: Option<SharedOperationError>) {
        *self.cause.write() = cause;
    }

    /// Replace the implicit context after construction
    pub fn set_context(&self, context: Option<SharedOperationError>) {
        *self.context.write() = context;
    }

    /// Flatten the cause/context graph reachable from `error`
    ///
    /// Breadth-first, `cause` before `context`; a context identical to the
    /// cause is skipped. Every error is yielded at most once (identity based),
    /// and `error` itself is never part of the result, so cyclic chains
    /// terminate.
    pub fn chain(error: &SharedOperationError) -> Vec<SharedOperationError> {
        let mut visited: HashSet<*const Self> = HashSet::new();
        visited.insert(Arc::as_ptr(error));

        let mut queue = VecDeque::from([Arc::clone(error)]);
        let mut links = Vec::new();

        while let Some(current) = queue.pop_front() {
            let cause = current.cause();
            let context = current
                .context()
                .filter(|ctx| cause.as_ref().is_none_or(|c| !Arc::ptr_eq(c, ctx)));

            for link in cause.into_iter().chain(context) {
                if visited.insert(Arc::as_ptr(&link)) {
                    links.push(Arc::clone(&link));
                    queue.push_back(link);
                }
            }
        }

        links
    }
}

impl fmt::Display for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.exception_type, self.message)
    }
}

// Links are summarised; printing them could recurse forever on a cycle.
impl fmt::Debug for OperationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationError")
            .field("exception_type", &self.exception_type)
            .field("message", &self.message)
            .field("frames", &self.frames)
            .field("has_cause", &self.cause.read().is_some())
            .field("has_context", &self.context.read().is_some())
            .finish()
    }
}

impl std::error::Error for OperationError {}
