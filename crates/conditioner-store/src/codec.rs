use chrono::{DateTime, Utc};
use conditioner_types::{ConditionerError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// JSON-encodes a value for storage in a `TEXT` column. Used for the bag and
/// enum fields in the data model (rhythm metadata, forbidden-pattern counts,
/// archetype distributions) so the schema doesn't need one column per key.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ConditionerError::PersistenceFailure(e.to_string()))
}

pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| ConditionerError::PersistenceFailure(e.to_string()))
}

pub fn to_rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

pub fn from_rfc3339(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ConditionerError::PersistenceFailure(e.to_string()))
}

pub fn to_rfc3339_opt(ts: Option<&DateTime<Utc>>) -> Option<String> {
    ts.map(to_rfc3339)
}

pub fn from_rfc3339_opt(text: Option<String>) -> Result<Option<DateTime<Utc>>> {
    text.map(|t| from_rfc3339(&t)).transpose()
}
