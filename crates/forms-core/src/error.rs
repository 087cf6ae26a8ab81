//! Error types for form resolution.

use thiserror::Error;

/// Main error type for form operations.
///
/// Every variant aborts the current compilation pass. Values that are merely
/// not available yet are reported through [`crate::Resolved::Unknown`] instead.
#[derive(Error, Debug, Clone)]
pub enum FormError {
    /// No environment was configured for this model.
    #[error("The environment of this model should be configured in config>environment")]
    EnvironmentNotConfigured,

    /// The requested entity type is not known to the catalog.
    #[error("Entity type {name} is not defined")]
    TypeNotFound { name: String },

    /// The given value cannot be used as a record identifier.
    #[error("Invalid record id: {0:?}")]
    InvalidRecordId(String),

    /// `one` was called on a form that may hold more than one record.
    #[error("one can only be used on forms for which only one instance can exist, {form} does not set record_count = 1")]
    NotSingleton { form: String },

    /// The attribute is not declared on the form.
    #[error("Form {form} has no attribute {attribute}")]
    UndeclaredAttribute { form: String, attribute: String },

    /// A singleton form holds more than one record.
    #[error("Only one record for form {form} may exist, {count} were returned")]
    TooManyRecords { form: String, count: usize },

    /// The remote store answered with a non-success code.
    #[error("Store error ({code}): {message}")]
    StoreError { code: u16, message: String },

    /// The remote store could not be reached.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration could not be read.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl FormError {
    /// Returns true if the failure happened below the store protocol.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FormError::ConnectionError(_) | FormError::SerializationError(_)
        )
    }

    /// Returns the form type involved in the error, if any.
    pub fn form(&self) -> Option<&str> {
        match self {
            FormError::NotSingleton { form } => Some(form),
            FormError::UndeclaredAttribute { form, .. } => Some(form),
            FormError::TooManyRecords { form, .. } => Some(form),
            _ => None,
        }
    }
}

/// Convenience Result type for form operations.
pub type Result<T> = std::result::Result<T, FormError>;

impl From<serde_json::Error> for FormError {
    fn from(err: serde_json::Error) -> Self {
        FormError::SerializationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_records_message() {
        let err = FormError::TooManyRecords {
            form: "infra::Server".to_string(),
            count: 3,
        };
        let message = err.to_string();
        assert!(message.contains("infra::Server"));
        assert!(message.contains('3'));
        assert_eq!(err.form(), Some("infra::Server"));
    }

    #[test]
    fn test_transport_errors() {
        assert!(FormError::ConnectionError("refused".into()).is_transport());
        assert!(!FormError::EnvironmentNotConfigured.is_transport());
        assert!(!FormError::StoreError { code: 500, message: "boom".into() }.is_transport());
    }
}
