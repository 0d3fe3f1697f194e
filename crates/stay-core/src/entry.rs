//! Travel entries and the JSON interchange format.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{CountryCode, EntryId};

/// One border crossing.
///
/// Dates are local calendar dates. `arrival_date >= departure_date` is
/// assumed but not enforced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TravelEntry {
    pub id: EntryId,
    pub departure_country: CountryCode,
    pub arrival_country: CountryCode,
    pub departure_date: NaiveDate,
    pub arrival_date: NaiveDate,
}

impl TravelEntry {
    /// Returns true when the entry departs and arrives in the same country.
    pub fn is_domestic(&self) -> bool {
        self.departure_country == self.arrival_country
    }
}

/// Errors from parsing an entry export.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The top-level value is not an array.
    #[error("expected a JSON array of entries, found {found}")]
    NotAnArray { found: &'static str },

    /// An array element is not a valid entry.
    #[error("invalid entry at index {index}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parses an exported entry list.
///
/// Only a top-level array is accepted.
pub fn parse_entries_json(input: &str) -> Result<Vec<TravelEntry>, ImportError> {
    let value: Value = serde_json::from_str(input)?;
    let Value::Array(items) = value else {
        return Err(ImportError::NotAnArray {
            found: json_kind(&value),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|source| ImportError::InvalidEntry { index, source })
        })
        .collect()
}

/// Serializes entries as a pretty-printed JSON array.
pub fn entries_to_json(entries: &[TravelEntry]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(entries)
}
