use serde::Deserialize;
use serde_json::{json, Value};

use crate::core::kb_client::{KbClient, RagDocument};
use crate::error::{CompletionErr, CompletionError};

/// The real [KbClient]: one HTTP call per collection against `kb`'s own
/// `POST /collections/{id}/query`, using `simple_query`. `kb`
/// and `completions` are separate processes (§1), so this is a `reqwest`
/// client rather than a function call — the only outbound dependency the
/// RAG fan-out has.
pub struct HttpKbClient {
    client: reqwest::Client,
}

impl HttpKbClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpKbClient {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct KbQueryResponse {
    #[serde(default)]
    results: Vec<KbQueryResult>,
}

#[derive(Debug, Deserialize)]
struct KbQueryResult {
    similarity: f32,
    data: String,
    #[serde(default)]
    metadata: Value,
}

#[async_trait::async_trait]
impl KbClient for HttpKbClient {
    async fn query(
        &self,
        server_url: &str,
        api_token: &str,
        collection_id: &str,
        query_text: &str,
        top_k: u32,
    ) -> Result<Vec<RagDocument>, CompletionError> {
        let url = format!(
            "{}/collections/{}/query?plugin_name=simple_query",
            server_url.trim_end_matches('/'),
            collection_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_token)
            .json(&json!({
                "query_text": query_text,
                "top_k": top_k,
                "threshold": 0.0,
            }))
            .send()
            .await
            .map_err(|e| CompletionError::new(file!(), line!(), column!(), CompletionErr::Reqwest(e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::new(
                file!(),
                line!(),
                column!(),
                CompletionErr::Provider(format!("kb {status}: {}", text.chars().take(500).collect::<String>())),
            ));
        }

        let parsed: KbQueryResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::new(file!(), line!(), column!(), CompletionErr::Reqwest(e)))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| RagDocument {
                collection_id: collection_id.to_string(),
                similarity: r.similarity,
                text: r.data,
                metadata: r.metadata,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn queries_kb_and_normalizes_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/collections/col-1/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{"similarity": 0.8, "data": "hit text", "metadata": {"source": "a.txt"}}],
                "count": 1,
                "query": "q",
            })))
            .mount(&server)
            .await;

        let client = HttpKbClient::new();
        let docs = client.query(&server.uri(), "tok", "col-1", "q", 5).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "hit text");
        assert_eq!(docs[0].collection_id, "col-1");
    }
}
