//! Quick Start Example
//!
//! Resolves a singleton form over two compilation passes: the first pass
//! defers `hostname` because no record exists, the second one picks it up
//! after the record was filled in.

use std::sync::Arc;

use forms_plugin::prelude::*;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 1. Declare the entity the form is derived from
    let server = Entity::builder("infra::Server")
        .attribute("hostname", TypeDescriptor::String)
        .attribute_with_default("replicas", TypeDescriptor::Number, json!(1))
        .option("record_count", json!(1))
        .build();
    let catalog = EntityCatalog::new().with(Arc::new(server));

    let store = Arc::new(InMemoryFormStore::new("dev"));
    let config = PluginConfig::from_env().with_environment("dev");
    let resolver = FormResolver::new(store.clone(), Arc::new(catalog), config);

    // 2. Compile until every parameter is known
    let mut driver = PassDriver::new(3);
    while let Some(mut session) = driver.next_session() {
        let hostname = resolver.one(&mut session, "hostname", "infra::Server").await?;
        let replicas = resolver.one(&mut session, "replicas", "infra::Server").await?;
        info!(?hostname, ?replicas, pass = session.pass, "Resolved");

        resolver.report("server_hostname", &hostname).await?;

        if driver.complete(session).is_final() {
            break;
        }

        // Someone fills in the form between passes
        let fields = json!({"hostname": "db1.example.com", "replicas": 2});
        if let Some(fields) = fields.as_object() {
            store.create_record("infra::Server", fields.clone()).await;
        }
    }

    for unknown in driver.unresolved() {
        info!(parameter = %unknown.parameter, "Still unresolved");
    }

    Ok(())
}
