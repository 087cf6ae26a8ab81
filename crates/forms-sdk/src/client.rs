//! HTTP implementation of the form store.

use std::time::Duration;

use async_trait::async_trait;
use forms_core::{FormError, FormSchema, ParamSource, RecordId, Result, Value};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::store::{FormStore, RecordEnvelope, RecordList, StoreResponse};

/// Header carrying the environment identifier.
pub const ENVIRONMENT_HEADER: &str = "X-Environment";

/// Connection settings for [`HttpFormStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreClientConfig {
    /// Base URL of the store, e.g. `http://localhost:8888`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout of a single request in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for StoreClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Client for a form store reachable over HTTP.
#[derive(Clone)]
pub struct HttpFormStore {
    /// Base URL of the store.
    base_url: Url,

    /// HTTP client.
    http_client: reqwest::Client,
}

/// Request body for setting a parameter.
#[derive(Debug, Serialize)]
struct SetParamRequest<'a> {
    value: &'a Value,
    source: ParamSource,
    metadata: Value,
}

/// Request body for upserting a form.
#[derive(Debug, Serialize)]
struct PutFormRequest<'a> {
    form: &'a FormSchema,
}

impl HttpFormStore {
    /// Create a client from connection settings.
    pub fn new(config: &StoreClientConfig) -> Result<Self> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| FormError::ConfigError(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(FormError::ConfigError(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| FormError::ConnectionError(e.to_string()))?;

        Ok(Self {
            base_url,
            http_client,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL always has a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn record_url(&self, id: &RecordId) -> Url {
        self.endpoint(&["api", "v1", "record", id.as_str()])
    }

    fn form_url(&self, form_type: &str) -> Url {
        self.endpoint(&["api", "v1", "form", form_type])
    }

    fn records_url(&self) -> Url {
        self.endpoint(&["api", "v1", "records"])
    }

    fn param_url(&self, id: &str) -> Url {
        self.endpoint(&["api", "v1", "param", id])
    }

    /// Send a request and split the answer into result or error payload.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        env: &str,
    ) -> Result<StoreResponse<T>> {
        let response = request
            .header(ENVIRONMENT_HEADER, env)
            .send()
            .await
            .map_err(|e| FormError::ConnectionError(e.to_string()))?;

        let code = response.status().as_u16();

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let error = serde_json::from_str::<Value>(&error_text)
                .unwrap_or(Value::String(error_text));
            tracing::debug!(code, "Store request failed");
            return Ok(StoreResponse::failure(code, error));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FormError::ConnectionError(e.to_string()))?;
        let result: T = decode_body(&body)?;

        Ok(StoreResponse {
            code,
            result: Some(result),
            error: None,
        })
    }
}

/// Decode a success body. An empty body (e.g. 204) decodes as `null`.
fn decode_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    if body.trim().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_str(body)?)
}

#[async_trait]
impl FormStore for HttpFormStore {
    async fn get_record(&self, env: &str, id: &RecordId) -> Result<StoreResponse<RecordEnvelope>> {
        let request = self.http_client.get(self.record_url(id));
        self.send(request, env).await
    }

    async fn put_form(
        &self,
        env: &str,
        form_type: &str,
        form: &FormSchema,
    ) -> Result<StoreResponse<Value>> {
        let request = self
            .http_client
            .put(self.form_url(form_type))
            .json(&PutFormRequest { form });
        self.send(request, env).await
    }

    async fn list_records(
        &self,
        env: &str,
        form_type: &str,
        include_record: bool,
    ) -> Result<StoreResponse<RecordList>> {
        let include = if include_record { "true" } else { "false" };
        let request = self
            .http_client
            .get(self.records_url())
            .query(&[("form_type", form_type), ("include_record", include)]);
        self.send(request, env).await
    }

    async fn set_param(
        &self,
        env: &str,
        id: &str,
        value: &Value,
        source: ParamSource,
        metadata: Value,
    ) -> Result<StoreResponse<Value>> {
        let request = self.http_client.put(self.param_url(id)).json(&SetParamRequest {
            value,
            source,
            metadata,
        });
        self.send(request, env).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    fn store(base_url: &str) -> HttpFormStore {
        HttpFormStore::new(&StoreClientConfig {
            base_url: base_url.to_string(),
            timeout_ms: 2_000,
        })
        .unwrap()
    }

    fn content_length(head: &str) -> usize {
        head.lines()
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse().ok())
            .unwrap_or(0)
    }

    /// Answer a single request with a fixed response and hand back the request head.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            let head = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..n]);
                if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..end]).to_string();
                    if n == 0 || buf.len() >= end + 4 + content_length(&head) {
                        break head;
                    }
                } else if n == 0 {
                    break String::from_utf8_lossy(&buf).to_string();
                }
            };

            let response = format!(
                "{}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            head
        });

        (base_url, handle)
    }

    #[test]
    fn test_urls() {
        let store = store("http://store:8888/");

        assert_eq!(store.base_url(), "http://store:8888");
        assert_eq!(
            store.record_url(&RecordId::parse("r1").unwrap()).as_str(),
            "http://store:8888/api/v1/record/r1"
        );
        assert_eq!(
            store.form_url("infra::Server").as_str(),
            "http://store:8888/api/v1/form/infra::Server"
        );
        assert_eq!(store.records_url().as_str(), "http://store:8888/api/v1/records");
    }

    #[test]
    fn test_reserved_characters_stay_in_one_segment() {
        let store = store("http://store:8888");

        let url = store.param_url("web#port");
        assert_eq!(url.path(), "/api/v1/param/web%23port");
        assert_eq!(url.fragment(), None);

        let url = store.param_url("a/b?c");
        assert_eq!(url.path(), "/api/v1/param/a%2Fb%3Fc");
        assert_eq!(url.query(), None);

        let url = store.record_url(&RecordId::parse("x/../y").unwrap());
        assert_eq!(url.path_segments().unwrap().count(), 4);
    }

    #[test]
    fn test_base_url_with_path_prefix() {
        let store = store("http://store:8888/forms/");
        assert_eq!(
            store.param_url("out").as_str(),
            "http://store:8888/forms/api/v1/param/out"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let err = HttpFormStore::new(&StoreClientConfig {
            base_url: "not a url".to_string(),
            timeout_ms: 1_000,
        })
        .err()
        .unwrap();
        assert!(matches!(err, FormError::ConfigError(_)));
    }

    #[test]
    fn test_config_defaults() {
        let config: StoreClientConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, "http://localhost:8888");
        assert_eq!(config.timeout_ms, 30_000);
    }

    #[test]
    fn test_decode_empty_body() {
        assert_eq!(decode_body::<Value>("").unwrap(), Value::Null);
        assert_eq!(decode_body::<Value>("  \n").unwrap(), Value::Null);
        assert_eq!(decode_body::<Value>("{\"id\": 1}").unwrap(), json!({"id": 1}));

        let err = decode_body::<RecordEnvelope>("").unwrap_err();
        assert!(matches!(err, FormError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_set_param_no_content() {
        let (base_url, server) = serve_once("HTTP/1.1 204 No Content", "").await;
        let store = store(&base_url);

        let response = store
            .set_param("env", "web#port", &json!(8080), ParamSource::Report, json!({"type": "report"}))
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.code, 204);
        assert_eq!(response.result, Some(Value::Null));

        let head = server.await.unwrap();
        let request_line = head.lines().next().unwrap();
        assert_eq!(request_line, "PUT /api/v1/param/web%23port HTTP/1.1");
        assert!(head.to_ascii_lowercase().contains("x-environment: env"));
    }

    #[tokio::test]
    async fn test_error_answer_keeps_payload() {
        let (base_url, server) =
            serve_once("HTTP/1.1 404 Not Found", "{\"message\": \"no such record\"}").await;
        let store = store(&base_url);

        let response = store
            .get_record("env", &RecordId::parse("r1").unwrap())
            .await
            .unwrap();

        assert!(response.is_not_found());
        assert_eq!(response.error_message(), "no such record");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_store_is_connection_error() {
        let store = store("http://127.0.0.1:1");

        let err = store
            .list_records("env", "infra::Server", true)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
