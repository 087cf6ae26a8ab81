//! Resolution of form fields and records during a compilation pass.
//!
//! Missing data never fails a pass: the parameter is registered as unknown
//! in the session and [`Resolved::Unknown`] is returned, so that a later pass
//! can pick the value up once the record exists. Contract violations and
//! store errors on listings are returned as [`FormError`].

use std::sync::Arc;

use forms_core::{
    EntityCatalog, Fields, FormError, FormSchema, RecordId, Resolved, Result, Value,
};
use forms_sdk::{FormStore, RecordSummary};
use forms_state::CompileSession;
use tracing::{debug, info, warn};

use crate::config::PluginConfig;

/// Resolves form values against a remote store.
#[derive(Clone)]
pub struct FormResolver {
    pub(crate) store: Arc<dyn FormStore>,
    catalog: Arc<EntityCatalog>,
    pub(crate) config: PluginConfig,
}

impl FormResolver {
    /// Create a resolver.
    pub fn new(store: Arc<dyn FormStore>, catalog: Arc<EntityCatalog>, config: PluginConfig) -> Self {
        Self {
            store,
            catalog,
            config,
        }
    }

    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// Derive the schema of a named entity type.
    pub fn schema(&self, type_name: &str) -> Result<FormSchema> {
        let entity = self.catalog.get_type(type_name)?;
        Ok(FormSchema::derive(entity.as_ref()))
    }

    /// Get one field of a record.
    ///
    /// The record is fetched once and cached in the session; later lookups
    /// of the same `instance` are served from the cache.
    pub async fn get(
        &self,
        session: &mut CompileSession,
        name: &str,
        instance: &str,
    ) -> Result<Resolved> {
        let env = self.config.environment()?;

        if !session.cache.contains(instance) {
            let record_id = RecordId::parse(instance)?;
            debug!(record_id = %record_id, "Fetching record");

            let response = self.store.get_record(env, &record_id).await?;
            let envelope = if response.is_success() {
                response.result
            } else {
                debug!(
                    record_id = %record_id,
                    code = response.code,
                    error = %response.error_message(),
                    "Record not available"
                );
                None
            };

            match envelope {
                Some(envelope) => {
                    session.cache.insert(instance, envelope.record.fields);
                }
                None => {
                    session.unknowns.register_record(name, instance);
                    return Ok(Resolved::unknown(name));
                }
            }
        }

        let value = session
            .cache
            .get(instance)
            .and_then(|fields| fields.get(name))
            .cloned();

        Ok(match value {
            Some(value) => Resolved::Known(value),
            None => {
                session.unknowns.register_record(name, instance);
                Resolved::unknown(name)
            }
        })
    }

    /// List the ids of all records of a form.
    ///
    /// `expecting` is the number of records the caller hopes for; fewer
    /// records only produce a warning.
    pub async fn instances(
        &self,
        session: &mut CompileSession,
        instance_type: &str,
        expecting: usize,
    ) -> Result<Vec<String>> {
        let ids: Vec<String> = self
            .sync_records(session, instance_type)
            .await?
            .into_iter()
            .map(|(id, _)| id)
            .collect();

        if ids.len() < expecting {
            warn!(
                form = instance_type,
                expecting,
                found = ids.len(),
                "Fewer records than expected"
            );
        }

        Ok(ids)
    }

    /// Get the fields of all records of a form.
    pub async fn all(&self, session: &mut CompileSession, instance_type: &str) -> Result<Vec<Fields>> {
        let records = self.sync_records(session, instance_type).await?;
        Ok(records.into_iter().map(|(_, fields)| fields).collect())
    }

    /// Get a field of a form that holds at most one record.
    pub async fn one(
        &self,
        session: &mut CompileSession,
        name: &str,
        entity: &str,
    ) -> Result<Resolved> {
        let env = self.config.environment()?;
        let schema = self.schema(entity)?;

        if !schema.is_singleton() {
            return Err(FormError::NotSingleton {
                form: schema.form_type,
            });
        }

        let default = match schema.attribute(name) {
            Some(attribute) => attribute.default.clone(),
            None => {
                return Err(FormError::UndeclaredAttribute {
                    form: schema.form_type,
                    attribute: name.to_string(),
                })
            }
        };

        self.push_schema(env, &schema).await?;

        let response = self
            .store
            .list_records(env, &schema.form_type, false)
            .await?;
        let records = if response.is_not_found() {
            Vec::new()
        } else {
            response.into_result()?.records
        };

        match records.as_slice() {
            [] => Ok(match default {
                Some(value) => {
                    debug!(form = %schema.form_type, parameter = name, "No record, using default");
                    Resolved::Known(value)
                }
                None => {
                    session.unknowns.register_form(name, &schema.form_type);
                    Resolved::unknown(name)
                }
            }),
            [record] => self.singleton_field(session, env, name, record).await,
            records => Err(FormError::TooManyRecords {
                form: schema.form_type,
                count: records.len(),
            }),
        }
    }

    /// Fetch the only record of a singleton form and read one field.
    async fn singleton_field(
        &self,
        session: &mut CompileSession,
        env: &str,
        name: &str,
        summary: &RecordSummary,
    ) -> Result<Resolved> {
        let record_id = RecordId::parse(&summary.id)?;
        let response = self.store.get_record(env, &record_id).await?;

        let value: Option<Value> = if response.is_success() {
            response.result.and_then(|envelope| {
                let fields = session.cache.insert(summary.id.clone(), envelope.record.fields);
                fields.get(name).cloned()
            })
        } else {
            None
        };

        Ok(match value {
            Some(value) => Resolved::Known(value),
            None => {
                session.unknowns.register_record(name, &summary.id);
                Resolved::unknown(name)
            }
        })
    }

    /// Push the schema of a form to the store.
    async fn push_schema(&self, env: &str, schema: &FormSchema) -> Result<()> {
        debug!(form = %schema.form_type, "Pushing form schema");
        self.store
            .put_form(env, &schema.form_type, schema)
            .await?
            .into_result()
            .map(|_| ())
    }

    /// Push the schema of a form, list its records and cache them.
    ///
    /// Returns id and fields of every listed record, in the order of the store.
    async fn sync_records(
        &self,
        session: &mut CompileSession,
        instance_type: &str,
    ) -> Result<Vec<(String, Fields)>> {
        let env = self.config.environment()?;
        let schema = self.schema(instance_type)?;

        self.push_schema(env, &schema).await?;

        let list = self
            .store
            .list_records(env, &schema.form_type, true)
            .await?
            .into_result()?;

        info!(
            form = %schema.form_type,
            records = list.records.len(),
            "Listed form records"
        );

        let mut records = Vec::with_capacity(list.records.len());
        for record in list.records {
            let fields = record.fields.unwrap_or_default();
            session.cache.insert(record.id.clone(), fields.clone());
            records.push((record.id, fields));
        }

        Ok(records)
    }
}
