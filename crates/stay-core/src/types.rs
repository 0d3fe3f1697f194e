//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// Invalid window policy value.
    #[error("invalid window policy: {value} (expected calendar-year or rolling-12-month)")]
    InvalidWindowPolicy { value: String },

    /// Invalid closing policy value.
    #[error("invalid closing policy: {value} (expected next-entry or matching-departure)")]
    InvalidClosingPolicy { value: String },

    /// The year cannot be represented as a calendar date.
    #[error("year out of range: {year}")]
    YearOutOfRange { year: i32 },
}

/// Generates a validated string ID newtype with common trait implementations.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                if id.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(id))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_string_id!(
    /// A validated travel entry identifier.
    ///
    /// Entry IDs are opaque to the engine. Uniqueness is the caller's concern.
    EntryId, "entry ID"
);

define_string_id!(
    /// A validated country code (e.g., "AU", "NZ").
    ///
    /// Codes are compared exactly. Front ends upper-case user input before
    /// constructing one.
    CountryCode, "country code"
);

/// How a rule's observation window is derived from the reference date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowPolicy {
    /// January 1 to December 31 of the target year.
    CalendarYear,
    /// The twelve months ending at the reference date.
    #[serde(rename = "rolling-12-month")]
    Rolling12Month,
}

impl WindowPolicy {
    /// String representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CalendarYear => "calendar-year",
            Self::Rolling12Month => "rolling-12-month",
        }
    }

    /// Short human label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CalendarYear => "Calendar Year",
            Self::Rolling12Month => "Rolling 12mo",
        }
    }
}

impl fmt::Display for WindowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WindowPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "calendar-year" => Ok(Self::CalendarYear),
            "rolling-12-month" => Ok(Self::Rolling12Month),
            _ => Err(ValidationError::InvalidWindowPolicy {
                value: s.to_string(),
            }),
        }
    }
}

/// Classification of a day count against a rule's threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Below 80% of the threshold.
    Safe,
    /// At or above 80% of the threshold but below it.
    Warning,
    /// At or above the threshold.
    Danger,
}

impl Status {
    /// String representation for machine output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Warning => "Approaching Limit",
            Self::Danger => "Over Threshold",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
