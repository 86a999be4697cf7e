//! Implementation path value object
//!
//! A fully-qualified, dotted reference to a registered implementation
//! (e.g. `calendar.events.create_event`). Paths are registry keys, not
//! something loaded on demand.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::DomainError;

/// A dotted reference to a callable implementation
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ImplementationPath(String);

impl ImplementationPath {
    /// Parse and validate a dotted path
    ///
    /// Every segment must be a non-empty run of ASCII alphanumerics or `_`.
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.is_empty() {
            return Err(DomainError::InvalidImplementationPath(
                "path is empty".to_string(),
            ));
        }
        let valid = path.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !valid {
            return Err(DomainError::InvalidImplementationPath(path));
        }
        Ok(Self(path))
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// All segments but the last (the "module" part)
    pub fn module(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(module, _)| module)
    }

    /// The last segment (the "function" part)
    pub fn function(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, f)| f)
    }
}

impl fmt::Display for ImplementationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ImplementationPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for ImplementationPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}
