use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::core::model::file_registry::IngestChunk;
use crate::core::plugin::{IngestPlugin, PluginKind};
use crate::core::vector::{META_FILE_URL, META_SOURCE};
use crate::err;
use crate::error::KbError;
use crate::map_err;

use super::{split, split_params_schema, SplitParams};

#[derive(Debug, Deserialize)]
struct UrlIngestParams {
    urls: Vec<String>,
    #[serde(flatten)]
    split: SplitParams,
}

/// Fetches each URL, converts the response body to Markdown, and chunks it
/// with the same knobs as [super::simple_ingest::SimpleIngest] (§4.4). A
/// remote-ingest plugin invoked through `IngestBase`, never `IngestFile`.
pub struct UrlIngest {
    client: reqwest::Client,
}

impl Default for UrlIngest {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IngestPlugin for UrlIngest {
    fn name(&self) -> &'static str {
        "url_ingest"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::RemoteIngest
    }

    fn description(&self) -> &'static str {
        "Fetches URLs, converts each response to Markdown, and chunks the result."
    }

    fn supported_file_types(&self) -> &'static [&'static str] {
        &[]
    }

    fn parameters(&self) -> Value {
        let mut schema = split_params_schema();
        if let Some(props) = schema.get_mut("properties").and_then(Value::as_object_mut) {
            props.insert("urls".to_string(), json!({ "type": "array", "items": { "type": "string" } }));
        }
        if let Some(required) = schema.get_mut("required").and_then(Value::as_array_mut) {
            required.push(json!("urls"));
        }
        schema
    }

    async fn ingest(
        &self,
        _file_path: Option<&str>,
        params: &Value,
    ) -> Result<Vec<IngestChunk>, KbError> {
        let params: UrlIngestParams = map_err!(serde_json::from_value(params.clone()));

        if params.urls.is_empty() {
            return err!(BadInput, "url_ingest requires at least one url");
        }

        let mut chunks = vec![];

        for url in &params.urls {
            let body = match self.fetch(url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("failed fetching '{url}': {e}");
                    continue;
                }
            };

            let markdown = map_err!(htmd::convert(&body));
            let split_chunks = match split(&markdown, &params.split) {
                Ok(c) => c,
                Err(e) => {
                    warn!("failed chunking content from '{url}': {e}");
                    continue;
                }
            };

            for text in split_chunks {
                let mut metadata = serde_json::Map::new();
                metadata.insert(META_SOURCE.to_string(), json!(url));
                metadata.insert(META_FILE_URL.to_string(), json!(url));
                chunks.push(IngestChunk { text, metadata });
            }
        }

        if chunks.is_empty() {
            return err!(BadInput, "url_ingest produced zero chunks from {} url(s)", params.urls.len());
        }

        Ok(chunks)
    }
}

impl UrlIngest {
    async fn fetch(&self, url: &str) -> Result<String, KbError> {
        let response = map_err!(self.client.get(url).send().await);
        let status = response.status();
        if !status.is_success() {
            return err!(BadInput, "fetching '{}' failed with status {}", url, status);
        }
        Ok(map_err!(response.text().await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn ingests_two_urls() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Hello from A</p>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Hello from B</p>"))
            .mount(&server)
            .await;

        let plugin = UrlIngest::default();
        let params = json!({
            "urls": [format!("{}/a", server.uri()), format!("{}/b", server.uri())],
        });

        let chunks = plugin.ingest(None, &params).await.unwrap();
        assert!(chunks.len() >= 2);
    }

    #[tokio::test]
    async fn rejects_empty_urls() {
        let plugin = UrlIngest::default();
        let err = plugin
            .ingest(None, &json!({ "urls": [] }))
            .await
            .unwrap_err();
        assert!(matches!(err.error, crate::error::KbErr::BadInput(_)));
    }
}
