//! In-memory form store, used for tests and local runs.

use std::collections::HashMap;

use async_trait::async_trait;
use forms_core::{Fields, FormSchema, ParamSource, Record, RecordId, Result, Value};
use indexmap::IndexMap;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::{FormStore, RecordEnvelope, RecordList, RecordSummary, StoreResponse};

/// Store operations, used for call accounting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    GetRecord,
    PutForm,
    ListRecords,
    SetParam,
}

/// Number of calls received per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub get_record: usize,
    pub put_form: usize,
    pub list_records: usize,
    pub set_param: usize,
}

impl StoreCalls {
    fn bump(&mut self, operation: StoreOperation) {
        match operation {
            StoreOperation::GetRecord => self.get_record += 1,
            StoreOperation::PutForm => self.put_form += 1,
            StoreOperation::ListRecords => self.list_records += 1,
            StoreOperation::SetParam => self.set_param += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.get_record + self.put_form + self.list_records + self.set_param
    }
}

/// A parameter as stored by `set_param`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredParam {
    pub value: Value,
    pub source: ParamSource,
    pub metadata: Value,
}

#[derive(Debug, Default)]
struct StoreData {
    /// Form schemas by form type.
    forms: HashMap<String, FormSchema>,

    /// Records per form type, in creation order.
    records: HashMap<String, IndexMap<String, Record>>,

    /// Parameters by id.
    params: HashMap<String, StoredParam>,

    /// Injected failures: operation -> (code, payload).
    failures: HashMap<StoreOperation, (u16, Value)>,

    calls: StoreCalls,
}

/// A form store for a single environment, kept in memory.
pub struct InMemoryFormStore {
    environment: String,
    data: RwLock<StoreData>,
}

impl InMemoryFormStore {
    /// Create an empty store serving the given environment.
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            data: RwLock::new(StoreData::default()),
        }
    }

    /// Create a record with a store-assigned id and return that id.
    pub async fn create_record(&self, form_type: &str, fields: Fields) -> String {
        let id = Uuid::new_v4().to_string();
        self.insert_record(
            form_type,
            Record {
                id: id.clone(),
                fields,
            },
        )
        .await;
        id
    }

    /// Add a record to a form. The form itself does not need to exist yet.
    pub async fn insert_record(&self, form_type: &str, record: Record) {
        let mut data = self.data.write().await;
        data.records
            .entry(form_type.to_string())
            .or_default()
            .insert(record.id.clone(), record);
    }

    /// Remove a record from whichever form holds it.
    pub async fn remove_record(&self, id: &str) -> Option<Record> {
        let mut data = self.data.write().await;
        data.records
            .values_mut()
            .find_map(|records| records.shift_remove(id))
    }

    /// The schema last pushed for a form.
    pub async fn form(&self, form_type: &str) -> Option<FormSchema> {
        self.data.read().await.forms.get(form_type).cloned()
    }

    /// A parameter set through `set_param`.
    pub async fn param(&self, id: &str) -> Option<StoredParam> {
        self.data.read().await.params.get(id).cloned()
    }

    /// Calls received so far.
    pub async fn calls(&self) -> StoreCalls {
        self.data.read().await.calls
    }

    /// Make every call of `operation` fail with the given code and payload.
    pub async fn inject_failure(&self, operation: StoreOperation, code: u16, payload: Value) {
        let mut data = self.data.write().await;
        data.failures.insert(operation, (code, payload));
    }

    pub async fn clear_failures(&self) {
        self.data.write().await.failures.clear();
    }

    /// Account for a call and return the injected failure or the
    /// environment mismatch answer, if any.
    fn check<T>(
        &self,
        data: &mut StoreData,
        operation: StoreOperation,
        env: &str,
    ) -> Option<StoreResponse<T>> {
        data.calls.bump(operation);

        if env != self.environment {
            return Some(StoreResponse::not_found(format!(
                "Environment {} not found",
                env
            )));
        }

        data.failures
            .get(&operation)
            .map(|(code, payload)| StoreResponse::failure(*code, payload.clone()))
    }
}

#[async_trait]
impl FormStore for InMemoryFormStore {
    async fn get_record(&self, env: &str, id: &RecordId) -> Result<StoreResponse<RecordEnvelope>> {
        let mut data = self.data.write().await;
        if let Some(response) = self.check(&mut data, StoreOperation::GetRecord, env) {
            return Ok(response);
        }

        let record = data
            .records
            .values()
            .find_map(|records| records.get(id.as_str()))
            .cloned();

        Ok(match record {
            Some(record) => StoreResponse::ok(RecordEnvelope { record }),
            None => StoreResponse::not_found(format!("Record {} not found", id)),
        })
    }

    async fn put_form(
        &self,
        env: &str,
        form_type: &str,
        form: &FormSchema,
    ) -> Result<StoreResponse<Value>> {
        let mut data = self.data.write().await;
        if let Some(response) = self.check(&mut data, StoreOperation::PutForm, env) {
            return Ok(response);
        }

        data.forms.insert(form_type.to_string(), form.clone());
        data.records.entry(form_type.to_string()).or_default();

        Ok(StoreResponse::ok(json!({ "form": form_type })))
    }

    async fn list_records(
        &self,
        env: &str,
        form_type: &str,
        include_record: bool,
    ) -> Result<StoreResponse<RecordList>> {
        let mut data = self.data.write().await;
        if let Some(response) = self.check(&mut data, StoreOperation::ListRecords, env) {
            return Ok(response);
        }

        if !data.forms.contains_key(form_type) {
            return Ok(StoreResponse::not_found(format!(
                "Form {} not found",
                form_type
            )));
        }

        let records = data
            .records
            .get(form_type)
            .map(|records| {
                records
                    .values()
                    .map(|record| RecordSummary {
                        id: record.id.clone(),
                        fields: include_record.then(|| record.fields.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(StoreResponse::ok(RecordList { records }))
    }

    async fn set_param(
        &self,
        env: &str,
        id: &str,
        value: &Value,
        source: ParamSource,
        metadata: Value,
    ) -> Result<StoreResponse<Value>> {
        let mut data = self.data.write().await;
        if let Some(response) = self.check(&mut data, StoreOperation::SetParam, env) {
            return Ok(response);
        }

        data.params.insert(
            id.to_string(),
            StoredParam {
                value: value.clone(),
                source,
                metadata,
            },
        );

        Ok(StoreResponse::ok(json!({ "id": id })))
    }
}
