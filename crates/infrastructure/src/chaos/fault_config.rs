//! On-disk fault configuration of a service.
//!
//! Each service directory may hold two companion files:
//!
//! - `error_rules.json`: list of [`ErrorRule`]s
//! - `error_kinds.json`: object mapping an error kind to either an exception
//!   type name or a full [`ErrorKindSpec`]
//!
//! Both absent disables injection for the service. One without the other,
//! unparsable JSON or an invalid rule is a configuration error.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use application::ApplicationError;
use domain::{ErrorKindSpec, ErrorRule};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::FaultPolicy;

/// File name of the rule list
pub const ERROR_RULES_FILE: &str = "error_rules.json";

/// File name of the error-kind dictionary
pub const ERROR_KINDS_FILE: &str = "error_kinds.json";

/// Errors raised while loading fault configuration
#[derive(Debug, Error)]
pub enum FaultConfigError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File is not valid JSON of the expected shape
    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Content is well-formed but inconsistent
    #[error("Invalid fault configuration: {0}")]
    Invalid(String),
}

impl From<FaultConfigError> for ApplicationError {
    fn from(err: FaultConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KindEntry {
    Exception(String),
    Spec(ErrorKindSpec),
}

impl From<KindEntry> for ErrorKindSpec {
    fn from(entry: KindEntry) -> Self {
        match entry {
            KindEntry::Exception(exception) => Self {
                exception,
                max_occurrences: None,
                default_message: None,
            },
            KindEntry::Spec(spec) => spec,
        }
    }
}

/// Parsed and validated fault configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaultConfig {
    pub policy: FaultPolicy,
    /// Directory the files were read from, if any
    pub source: Option<PathBuf>,
}

impl FaultConfig {
    /// Load the companion files from `dir`
    ///
    /// Returns `Ok(None)` when neither file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if only one file exists, a file cannot be read or
    /// parsed, or the rules are invalid.
    pub fn load(dir: &Path) -> Result<Option<Self>, FaultConfigError> {
        let rules_path = dir.join(ERROR_RULES_FILE);
        let kinds_path = dir.join(ERROR_KINDS_FILE);

        match (rules_path.is_file(), kinds_path.is_file()) {
            (false, false) => {
                debug!(dir = %dir.display(), "No fault configuration");
                Ok(None)
            },
            (true, false) => Err(FaultConfigError::Invalid(format!(
                "{} exists without {}",
                rules_path.display(),
                kinds_path.display()
            ))),
            (false, true) => Err(FaultConfigError::Invalid(format!(
                "{} exists without {}",
                kinds_path.display(),
                rules_path.display()
            ))),
            (true, true) => {
                let rules = read_file(&rules_path)?;
                let kinds = read_file(&kinds_path)?;
                let mut config = Self::from_json_parts(&rules, &rules_path, &kinds, &kinds_path)?;
                config.source = Some(dir.to_path_buf());
                Ok(Some(config))
            },
        }
    }

    /// Parse configuration held in memory
    ///
    /// # Errors
    ///
    /// Returns an error if either document is malformed or the rules are
    /// invalid.
    pub fn from_json(rules: &str, kinds: &str) -> Result<Self, FaultConfigError> {
        Self::from_json_parts(
            rules,
            Path::new(ERROR_RULES_FILE),
            kinds,
            Path::new(ERROR_KINDS_FILE),
        )
    }

    fn from_json_parts(
        rules: &str,
        rules_path: &Path,
        kinds: &str,
        kinds_path: &Path,
    ) -> Result<Self, FaultConfigError> {
        let rules: Vec<ErrorRule> =
            serde_json::from_str(rules).map_err(|source| FaultConfigError::Parse {
                path: rules_path.to_path_buf(),
                source,
            })?;
        let kinds: BTreeMap<String, KindEntry> =
            serde_json::from_str(kinds).map_err(|source| FaultConfigError::Parse {
                path: kinds_path.to_path_buf(),
                source,
            })?;
        let kinds = kinds
            .into_iter()
            .map(|(name, entry)| (name, entry.into()))
            .collect();

        Ok(Self {
            policy: FaultPolicy::compile(rules, kinds)?,
            source: None,
        })
    }
}

fn read_file(path: &Path) -> Result<String, FaultConfigError> {
    std::fs::read_to_string(path).map_err(|source| FaultConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
