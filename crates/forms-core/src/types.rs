//! Common types used across form resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FormError, Result};

/// A value exchanged with the remote store.
pub type Value = serde_json::Value;

/// The field mapping of a record.
pub type Fields = serde_json::Map<String, Value>;

/// Identifier of a record: a UUID or a store-assigned string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Parse a record identifier, rejecting blank input.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(FormError::InvalidRecordId(raw.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One concrete instance of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Identifier assigned by the store.
    #[serde(alias = "record_id")]
    pub id: String,

    /// Field values.
    #[serde(default)]
    pub fields: Fields,
}

/// Placeholder for a value that cannot be resolved in this compilation pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnknownValue {
    /// The parameter this value stands in for.
    pub source: String,
}

impl UnknownValue {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// Outcome of a resolution: either a real value or a deferred marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Resolved<T = Value> {
    /// The value is available.
    Known(T),
    /// The value is not available yet; a later pass may resolve it.
    Unknown(UnknownValue),
}

impl<T> Resolved<T> {
    /// Create a deferred marker for the given parameter.
    pub fn unknown(source: impl Into<String>) -> Self {
        Resolved::Unknown(UnknownValue::new(source))
    }

    /// Returns true if the value is available.
    pub fn is_known(&self) -> bool {
        matches!(self, Resolved::Known(_))
    }

    /// Returns true if the value is deferred.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Resolved::Unknown(_))
    }

    /// The resolved value, if any.
    pub fn known(self) -> Option<T> {
        match self {
            Resolved::Known(value) => Some(value),
            Resolved::Unknown(_) => None,
        }
    }

    /// Borrow the resolved value, if any.
    pub fn as_known(&self) -> Option<&T> {
        match self {
            Resolved::Known(value) => Some(value),
            Resolved::Unknown(_) => None,
        }
    }

    /// Transform the resolved value, keeping deferred markers as they are.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Resolved::Known(value) => Resolved::Known(f(value)),
            Resolved::Unknown(unknown) => Resolved::Unknown(unknown),
        }
    }
}

impl From<Value> for Resolved<Value> {
    fn from(value: Value) -> Self {
        Resolved::Known(value)
    }
}

impl From<UnknownValue> for Resolved<Value> {
    fn from(unknown: UnknownValue) -> Self {
        Resolved::Unknown(unknown)
    }
}

/// Origin tag attached to parameters pushed to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSource {
    /// Parameter derived from a form record.
    Form,
    /// Output value reported by the model.
    Report,
}

impl ParamSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamSource::Form => "form",
            ParamSource::Report => "report",
        }
    }
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
