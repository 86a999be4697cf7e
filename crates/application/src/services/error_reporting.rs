//! Error reporting mode
//!
//! Decides what happens when a resolved operation raises:
//!
//! - `raise`: the original error reaches the caller unchanged, after the
//!   report is optionally logged
//! - `structured`: the error is captured and an [`ErrorReport`] is returned
//!   as the call's result
//!
//! The process default is read once from `SIMHARNESS_ERROR_MODE` and is
//! fixed afterwards. A harness may still be built with an explicit mode.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{SecondsFormat, Utc};
use domain::{CauseEntry, ErrorReport, Frame, OperationError, SharedOperationError};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::ApplicationError;
use crate::operation::{CallOutcome, OperationResult};

/// Environment variable overriding the process default mode
pub const ERROR_MODE_ENV: &str = "SIMHARNESS_ERROR_MODE";

/// Frames kept per cause entry
pub const MINI_TRACEBACK_DEPTH: usize = 3;

const UNKNOWN: &str = "<unknown>";

/// How failures of resolved operations surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMode {
    /// Propagate the original error
    #[default]
    Raise,
    /// Return an error report instead of raising
    #[serde(alias = "error_dict")]
    Structured,
}

impl ErrorMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Raise => "raise",
            Self::Structured => "structured",
        }
    }

    /// Read the override variable
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the variable holds anything other
    /// than `raise`, `structured` or `error_dict`.
    pub fn from_env() -> Result<Option<Self>, ApplicationError> {
        match std::env::var(ERROR_MODE_ENV) {
            Ok(raw) => raw.parse().map(Some),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(ApplicationError::Configuration(
                format!("{ERROR_MODE_ENV} is not valid unicode"),
            )),
        }
    }
}

impl FromStr for ErrorMode {
    type Err = ApplicationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raise" => Ok(Self::Raise),
            "structured" | "error_dict" => Ok(Self::Structured),
            other => Err(ApplicationError::Configuration(format!(
                "unknown error mode '{other}', expected 'raise' or 'structured'"
            ))),
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

static CURRENT_MODE: OnceLock<ErrorMode> = OnceLock::new();

/// Process-wide default mode, resolved on first use
///
/// An unparsable override is logged and ignored here; bootstrap code that
/// must fail on it should call [`ErrorMode::from_env`] directly.
pub fn current_mode() -> ErrorMode {
    *CURRENT_MODE.get_or_init(|| match ErrorMode::from_env() {
        Ok(Some(mode)) => mode,
        Ok(None) => ErrorMode::default(),
        Err(e) => {
            warn!(error = %e, "Ignoring error mode override");
            ErrorMode::default()
        },
    })
}

/// Builds [`ErrorReport`]s from raised operation errors
#[derive(Debug, Clone, Copy)]
pub struct ErrorReportBuilder {
    mini_traceback_depth: usize,
}

impl Default for ErrorReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReportBuilder {
    pub const fn new() -> Self {
        Self {
            mini_traceback_depth: MINI_TRACEBACK_DEPTH,
        }
    }

    #[must_use]
    pub const fn with_mini_traceback_depth(mut self, depth: usize) -> Self {
        self.mini_traceback_depth = depth;
        self
    }

    /// Build a report for `error`
    ///
    /// `origin` is the logical origin of the call (service and operation);
    /// when given it wins over the deepest traceback frame.
    pub fn build(&self, error: &SharedOperationError, origin: Option<&Frame>) -> ErrorReport {
        let (module, function) = origin
            .or_else(|| error.deepest_frame())
            .map_or_else(
                || (UNKNOWN.to_string(), UNKNOWN.to_string()),
                |frame| (frame.module.clone(), frame.function.clone()),
            );

        let mut traceback: Vec<String> = error.frames().iter().map(ToString::to_string).collect();
        traceback.push(error.to_string());

        let causes = OperationError::chain(error)
            .iter()
            .map(|link| self.cause_entry(link))
            .collect();

        ErrorReport {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            exception_type: error.exception_type().to_string(),
            message: error.message().to_string(),
            module,
            function,
            traceback,
            causes,
        }
    }

    fn cause_entry(&self, link: &SharedOperationError) -> CauseEntry {
        let (module, function) = link.deepest_frame().map_or_else(
            || (UNKNOWN.to_string(), UNKNOWN.to_string()),
            |frame| (frame.module.clone(), frame.function.clone()),
        );
        let frames = link.frames();
        let skip = frames.len().saturating_sub(self.mini_traceback_depth);

        CauseEntry {
            exception_type: link.exception_type().to_string(),
            message: link.message().to_string(),
            module,
            function,
            mini_traceback: frames[skip..].iter().map(ToString::to_string).collect(),
        }
    }
}

/// Outermost wrapper policy of a resolved operation
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter {
    mode: ErrorMode,
    log_reports: bool,
    builder: ErrorReportBuilder,
}

impl ErrorReporter {
    pub const fn new(mode: ErrorMode, log_reports: bool) -> Self {
        Self {
            mode,
            log_reports,
            builder: ErrorReportBuilder::new(),
        }
    }

    pub const fn mode(&self) -> ErrorMode {
        self.mode
    }

    pub const fn log_reports(&self) -> bool {
        self.log_reports
    }

    /// Turn the raw result of a call into what the caller receives
    ///
    /// # Errors
    ///
    /// In raise mode, returns the very error the call produced.
    pub fn settle(
        &self,
        result: OperationResult,
        origin: &Frame,
    ) -> Result<CallOutcome, SharedOperationError> {
        let err = match result {
            Ok(value) => return Ok(CallOutcome::Completed(value)),
            Err(err) => err,
        };

        match self.mode {
            ErrorMode::Structured => Ok(CallOutcome::Reported(self.builder.build(&err, Some(origin)))),
            ErrorMode::Raise => {
                if self.log_reports {
                    let report = self.builder.build(&err, Some(origin));
                    error!(
                        service = %report.module,
                        operation = %report.function,
                        exception_type = %report.exception_type,
                        report = %report.to_value(),
                        "Operation raised"
                    );
                }
                Err(err)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use serde_json::json;

    fn origin() -> Frame {
        Frame::new("calendar", "create_event")
    }

    #[test]
    fn parses_modes_and_alias() {
        assert_eq!("raise".parse::<ErrorMode>().unwrap(), ErrorMode::Raise);
        assert_eq!(" Structured ".parse::<ErrorMode>().unwrap(), ErrorMode::Structured);
        assert_eq!("error_dict".parse::<ErrorMode>().unwrap(), ErrorMode::Structured);
        assert!("ignore".parse::<ErrorMode>().unwrap_err().is_configuration_error());
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_value(ErrorMode::Structured).unwrap(), json!("structured"));
        let mode: ErrorMode = serde_json::from_value(json!("error_dict")).unwrap();
        assert_eq!(mode, ErrorMode::Structured);
    }

    #[test]
    fn current_mode_is_stable() {
        assert_eq!(current_mode(), current_mode());
    }

    #[test]
    fn report_prefers_logical_origin() {
        let err = OperationError::value_error("x")
            .at("wrapper", "call")
            .at("calendar.store", "insert")
            .into_shared();

        let with_origin = ErrorReportBuilder::new().build(&err, Some(&origin()));
        assert_eq!(with_origin.module, "calendar");
        assert_eq!(with_origin.function, "create_event");

        let without = ErrorReportBuilder::new().build(&err, None);
        assert_eq!(without.module, "calendar.store");
        assert_eq!(without.function, "insert");
    }

    #[test]
    fn traceback_ends_with_type_and_message() {
        let err = OperationError::value_error("x").at("calendar", "create_event").into_shared();
        let report = ErrorReportBuilder::new().build(&err, None);
        assert_eq!(
            report.traceback,
            vec![
                "File \"calendar\", in create_event".to_string(),
                "ValueError: x".to_string()
            ]
        );
        assert!(report.timestamp.ends_with('Z'));
    }

    #[test]
    fn report_without_frames_uses_placeholder_origin() {
        let err = OperationError::value_error("x").into_shared();
        let report = ErrorReportBuilder::new().build(&err, None);
        assert_eq!(report.module, "<unknown>");
        assert_eq!(report.traceback, vec!["ValueError: x".to_string()]);
    }

    #[test]
    fn causes_are_flattened_with_mini_tracebacks() {
        let root = OperationError::key_error("missing")
            .at("a", "one")
            .at("b", "two")
            .at("c", "three")
            .at("d", "four")
            .into_shared();
        let top = OperationError::value_error("bad")
            .caused_by(Arc::clone(&root))
            .into_shared();

        let report = ErrorReportBuilder::new().build(&top, Some(&origin()));
        assert_eq!(report.causes.len(), 1);
        let cause = &report.causes[0];
        assert_eq!(cause.exception_type, "KeyError");
        assert_eq!(cause.module, "d");
        assert_eq!(cause.mini_traceback.len(), MINI_TRACEBACK_DEPTH);
        assert_eq!(cause.mini_traceback[0], "File \"b\", in two");
    }

    #[test]
    fn self_referential_chain_terminates() {
        let err = OperationError::value_error("loop").into_shared();
        err.set_cause(Some(Arc::clone(&err)));
        err.set_context(Some(Arc::clone(&err)));

        let report = ErrorReportBuilder::new().build(&err, None);
        assert!(report.causes.is_empty());

        err.set_cause(None);
        err.set_context(None);
    }

    #[test]
    fn structured_mode_returns_report() {
        let reporter = ErrorReporter::new(ErrorMode::Structured, false);
        let outcome = reporter
            .settle(Err(OperationError::value_error("x").into_shared()), &origin())
            .unwrap();
        let report = outcome.report().unwrap();
        assert!(report.exception_type.contains("ValueError"));
        assert_eq!(report.message, "x");
    }

    #[test]
    fn raise_mode_returns_same_error() {
        let reporter = ErrorReporter::new(ErrorMode::Raise, true);
        let err = OperationError::value_error("x").into_shared();
        let back = reporter.settle(Err(Arc::clone(&err)), &origin()).unwrap_err();
        assert!(Arc::ptr_eq(&err, &back));
        assert_eq!(back.message(), "x");
    }

    #[test]
    fn success_passes_through() {
        let reporter = ErrorReporter::new(ErrorMode::Structured, false);
        let outcome = reporter.settle(Ok(json!({ "id": 1 })), &origin()).unwrap();
        assert_eq!(outcome, CallOutcome::Completed(json!({ "id": 1 })));
    }
}
