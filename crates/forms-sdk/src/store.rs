//! Contract of the remote form store.

use async_trait::async_trait;
use forms_core::{Fields, FormError, FormSchema, ParamSource, Record, RecordId, Result, Value};
use serde::{Deserialize, Serialize};

/// Answer of the store: a status code plus either a result or an error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreResponse<T> {
    /// HTTP-style status code.
    pub code: u16,

    /// Body of a successful answer.
    pub result: Option<T>,

    /// Body of a failed answer.
    pub error: Option<Value>,
}

impl<T> StoreResponse<T> {
    /// A successful answer.
    pub fn ok(result: T) -> Self {
        Self {
            code: 200,
            result: Some(result),
            error: None,
        }
    }

    /// A failed answer with the given payload.
    pub fn failure(code: u16, error: Value) -> Self {
        Self {
            code,
            result: None,
            error: Some(error),
        }
    }

    /// A 404 answer.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::failure(404, serde_json::json!({ "message": message.into() }))
    }

    /// Returns true for 2xx codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_not_found(&self) -> bool {
        self.code == 404
    }

    /// Human readable description of the error payload.
    pub fn error_message(&self) -> String {
        match &self.error {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Object(map)) => match map.get("message").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => Value::Object(map.clone()).to_string(),
            },
            Some(other) => other.to_string(),
            None => format!("request failed with status {}", self.code),
        }
    }

    /// Turn a non-success answer into a [`FormError::StoreError`].
    pub fn into_result(self) -> Result<T> {
        if !self.is_success() {
            return Err(FormError::StoreError {
                code: self.code,
                message: self.error_message(),
            });
        }
        let code = self.code;
        self.result.ok_or_else(|| FormError::StoreError {
            code,
            message: "response carried no result".to_string(),
        })
    }
}

/// Body of a `get_record` answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEnvelope {
    pub record: Record,
}

/// Entry of a record listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    #[serde(alias = "record_id")]
    pub id: String,

    /// Present when the full record was requested.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Fields>,
}

/// Body of a `list_records` answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordList {
    pub records: Vec<RecordSummary>,
}

/// The remote store that holds forms, records and parameters.
///
/// Transport failures are reported as `Err`; protocol level failures come
/// back as a [`StoreResponse`] with a non-success code.
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Fetch one record with all its fields.
    async fn get_record(&self, env: &str, id: &RecordId) -> Result<StoreResponse<RecordEnvelope>>;

    /// Create or replace the schema of a form.
    async fn put_form(
        &self,
        env: &str,
        form_type: &str,
        form: &FormSchema,
    ) -> Result<StoreResponse<Value>>;

    /// List the records of a form, optionally with their fields.
    async fn list_records(
        &self,
        env: &str,
        form_type: &str,
        include_record: bool,
    ) -> Result<StoreResponse<RecordList>>;

    /// Set a parameter value.
    async fn set_param(
        &self,
        env: &str,
        id: &str,
        value: &Value,
        source: ParamSource,
        metadata: Value,
    ) -> Result<StoreResponse<Value>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_error_message_variants() {
        let r: StoreResponse<()> = StoreResponse::failure(500, json!({"message": "boom"}));
        assert_eq!(r.error_message(), "boom");

        let r: StoreResponse<()> = StoreResponse::failure(400, json!("bad request"));
        assert_eq!(r.error_message(), "bad request");

        let r: StoreResponse<()> = StoreResponse {
            code: 503,
            result: None,
            error: None,
        };
        assert!(r.error_message().contains("503"));
    }

    #[test]
    fn test_into_result() {
        assert_eq!(StoreResponse::ok(5).into_result().unwrap(), 5);

        let err = StoreResponse::<u8>::not_found("no such form").into_result().unwrap_err();
        assert!(matches!(err, FormError::StoreError { code: 404, .. }));
    }

    #[test]
    fn test_listing_accepts_record_id_key() {
        let list: RecordList =
            serde_json::from_value(json!({"records": [{"record_id": "r1"}]})).unwrap();
        assert_eq!(list.records[0].id, "r1");
        assert!(list.records[0].fields.is_none());
    }
}
