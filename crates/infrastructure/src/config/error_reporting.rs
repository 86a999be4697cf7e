//! Error reporting configuration.

use application::{ErrorMode, current_mode};
use serde::{Deserialize, Serialize};

use super::default_true;

/// How failures of resolved operations surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReportingAppConfig {
    /// `raise` or `structured`; falls back to `SIMHARNESS_ERROR_MODE`, then `raise`
    #[serde(default)]
    pub mode: Option<ErrorMode>,

    /// Log a report for every error raised in raise mode
    #[serde(default = "default_true")]
    pub log_reports: bool,
}

impl Default for ErrorReportingAppConfig {
    fn default() -> Self {
        Self {
            mode: None,
            log_reports: true,
        }
    }
}

impl ErrorReportingAppConfig {
    /// Configured mode, else the process mode
    pub fn effective_mode(&self) -> ErrorMode {
        self.mode.unwrap_or_else(current_mode)
    }
}
