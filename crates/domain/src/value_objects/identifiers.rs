//! Identifier value objects for services, operations and mutations
//!
//! All three share one grammar: 1-128 characters drawn from ASCII
//! alphanumerics, `_`, `-` and `.`.
//!
//! # Examples
//!
//! ```
//! use domain::{OperationName, ServiceName};
//!
//! let service = ServiceName::new("calendar").unwrap();
//! let operation = OperationName::new("create_event").unwrap();
//! assert_eq!(format!("{service}.{operation}"), "calendar.create_event");
//!
//! assert!(ServiceName::new("").is_err());
//! assert!(OperationName::new("create event").is_err());
//! ```

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use crate::errors::DomainError;

/// Maximum length of any identifier
pub const MAX_IDENTIFIER_LEN: usize = 128;

fn validate_identifier_chars(value: &str) -> Result<(), ValidationError> {
    if value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("identifier_chars").with_message(Cow::Borrowed(
            "only ASCII letters, digits, '_', '-' and '.' are allowed",
        )))
    }
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Validate)]
        #[serde(transparent)]
        pub struct $name {
            #[validate(
                length(min = 1, max = 128),
                custom(function = "validate_identifier_chars")
            )]
            value: String,
        }

        impl $name {
            /// Create a new identifier, validating its format
            ///
            /// # Errors
            ///
            /// Returns an error if the value is empty, too long, or contains
            /// characters outside the identifier grammar.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let candidate = Self {
                    value: value.into(),
                };
                candidate
                    .validate()
                    .map_err(|e| DomainError::invalid_identifier(&candidate.value, e.to_string()))?;
                Ok(candidate)
            }

            /// Identifier from a literal known to match the grammar
            ///
            /// Debug builds assert the grammar; use [`Self::new`] for
            /// anything not written in source.
            pub fn from_static(value: &'static str) -> Self {
                let identifier = Self {
                    value: value.to_string(),
                };
                debug_assert!(identifier.validate().is_ok(), "invalid identifier literal {value:?}");
                identifier
            }

            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.value
            }

            /// Consume and return the inner string
            pub fn into_inner(self) -> String {
                self.value
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.value
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.value
            }
        }

        impl std::str::FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = DomainError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

identifier! {
    /// Name of one simulated third-party service (e.g. `calendar`)
    ServiceName
}

identifier! {
    /// Public name of one capability exposed by a service (e.g. `create_event`)
    OperationName
}

identifier! {
    /// Name of a swappable alternate implementation set (e.g. `m01`)
    MutationName
}
