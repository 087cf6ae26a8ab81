//! Reporting output values back to the store.

use forms_core::{ParamSource, Resolved, Result, Value};
use forms_sdk::StoreResponse;
use serde_json::json;
use tracing::debug;

use crate::resolver::FormResolver;

impl FormResolver {
    /// Submit a labeled output value as a parameter with source `report`.
    ///
    /// Values that are still unknown are not submitted; `Ok(None)` is
    /// returned without contacting the store. Otherwise the answer of the
    /// store is handed back as is.
    pub async fn report(&self, name: &str, value: &Resolved) -> Result<Option<StoreResponse<Value>>> {
        let env = self.config.environment()?;

        let value = match value {
            Resolved::Known(value) => value,
            Resolved::Unknown(unknown) => {
                debug!(parameter = name, source = %unknown.source, "Skipping report of unknown value");
                return Ok(None);
            }
        };

        let response = self
            .store
            .set_param(env, name, value, ParamSource::Report, json!({ "type": "report" }))
            .await?;

        debug!(parameter = name, code = response.code, "Reported value");
        Ok(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use forms_core::FormError;
    use forms_sdk::InMemoryFormStore;
    use serde_json::json;

    use super::*;
    use crate::config::PluginConfig;
    use crate::resolver::tests::{catalog, resolver, ENV};

    #[tokio::test]
    async fn test_report_value() {
        let store = Arc::new(InMemoryFormStore::new(ENV));
        let resolver = resolver(store.clone());

        let response = resolver
            .report("endpoint", &Resolved::Known(json!("x")))
            .await
            .unwrap()
            .unwrap();

        assert!(response.is_success());
        assert_eq!(store.calls().await.set_param, 1);

        let param = store.param("endpoint").await.unwrap();
        assert_eq!(param.value, json!("x"));
        assert_eq!(param.source, ParamSource::Report);
        assert_eq!(param.metadata, json!({"type": "report"}));
    }

    #[tokio::test]
    async fn test_report_unknown_is_skipped() {
        let store = Arc::new(InMemoryFormStore::new(ENV));
        let resolver = resolver(store.clone());

        let response = resolver
            .report("endpoint", &Resolved::unknown("hostname"))
            .await
            .unwrap();

        assert!(response.is_none());
        assert_eq!(store.calls().await.total(), 0);
    }

    #[tokio::test]
    async fn test_report_text_mentioning_unknown() {
        let store = Arc::new(InMemoryFormStore::new(ENV));
        let resolver = resolver(store.clone());

        resolver
            .report("status", &Resolved::Known(json!("Unknown(source=hostname)")))
            .await
            .unwrap();

        assert_eq!(
            store.param("status").await.unwrap().value,
            json!("Unknown(source=hostname)")
        );
    }

    #[tokio::test]
    async fn test_report_requires_environment() {
        let store = Arc::new(InMemoryFormStore::new(ENV));
        let resolver = FormResolver::new(store.clone(), Arc::new(catalog()), PluginConfig::default());

        let err = resolver
            .report("endpoint", &Resolved::Known(json!("x")))
            .await
            .unwrap_err();
        assert!(matches!(err, FormError::EnvironmentNotConfigured));
        assert_eq!(store.calls().await.total(), 0);
    }

    #[tokio::test]
    async fn test_report_store_answer_is_returned() {
        let store = Arc::new(InMemoryFormStore::new("other-env"));
        let resolver = resolver(store);

        let response = resolver
            .report("endpoint", &Resolved::Known(json!(1)))
            .await
            .unwrap()
            .unwrap();
        assert!(response.is_not_found());
    }
}
