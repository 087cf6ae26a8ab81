//! Registry of parameters that could not be resolved yet.

use forms_core::ParamSource;
use serde::{Deserialize, Serialize};

/// Where a deferred parameter was looked for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UnknownOrigin {
    /// A specific record that was missing or lacked the field.
    Record { record_id: String },
    /// A singleton form without any record.
    Form { form: String },
}

/// Metadata describing why a parameter is unknown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnknownMetadata {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(flatten)]
    pub origin: UnknownOrigin,
}

/// A parameter the host should retry in a later compilation pass.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnknownParameter {
    pub parameter: String,
    pub source: ParamSource,
    pub metadata: UnknownMetadata,
}

impl UnknownParameter {
    fn form_lookup(parameter: &str, origin: UnknownOrigin) -> Self {
        Self {
            parameter: parameter.to_string(),
            source: ParamSource::Form,
            metadata: UnknownMetadata {
                kind: "form".to_string(),
                origin,
            },
        }
    }

    /// The record this parameter was looked up in, if any.
    pub fn record_id(&self) -> Option<&str> {
        match &self.metadata.origin {
            UnknownOrigin::Record { record_id } => Some(record_id),
            UnknownOrigin::Form { .. } => None,
        }
    }

    /// The form this parameter was looked up in, if it was not a specific record.
    pub fn form(&self) -> Option<&str> {
        match &self.metadata.origin {
            UnknownOrigin::Form { form } => Some(form),
            UnknownOrigin::Record { .. } => None,
        }
    }
}

/// Append-only log of deferred parameters.
#[derive(Debug, Clone, Default)]
pub struct UnknownRegistry {
    entries: Vec<UnknownParameter>,
}

impl UnknownRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a parameter that is missing from a specific record.
    pub fn register_record(&mut self, parameter: &str, record_id: &str) {
        tracing::debug!(parameter, record_id, "Deferring parameter");
        self.entries.push(UnknownParameter::form_lookup(
            parameter,
            UnknownOrigin::Record {
                record_id: record_id.to_string(),
            },
        ));
    }

    /// Record a parameter of a form that has no record yet.
    pub fn register_form(&mut self, parameter: &str, form: &str) {
        tracing::debug!(parameter, form, "Deferring parameter");
        self.entries.push(UnknownParameter::form_lookup(
            parameter,
            UnknownOrigin::Form {
                form: form.to_string(),
            },
        ));
    }

    /// All entries in registration order.
    pub fn entries(&self) -> &[UnknownParameter] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain all entries, leaving the registry empty.
    pub fn take(&mut self) -> Vec<UnknownParameter> {
        std::mem::take(&mut self.entries)
    }
}
