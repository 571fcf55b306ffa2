use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";

/// `openai` vendor: HTTPS, bearer-token auth, `{model, input}` request body.
pub struct OpenAiEmbedder {
    endpoint: String,
    key: String,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(endpoint: Option<&str>, api_key: &str) -> Self {
        Self {
            endpoint: endpoint
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_OPENAI_ENDPOINT.to_string()),
            key: api_key.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn embed(
        &self,
        content: &[&str],
        model: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbeddingRequest {
            model: model.to_string(),
            input: content.iter().map(|s| s.to_string()).collect(),
        };

        let response = self
            .client
            .post(format!(
                "{}/v1/embeddings",
                self.endpoint.trim_end_matches('/')
            ))
            .bearer_auth(&self.key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Provider {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let response: EmbeddingResponse = response.json().await?;

        debug!(
            "Embedded {} chunk(s) with '{}', used tokens {}-{} (prompt-total)",
            content.len(),
            response.model,
            response.usage.prompt_tokens,
            response.usage.total_tokens
        );

        Ok(response.data.into_iter().map(|o| o.embedding).collect())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    object: String,
    data: Vec<EmbeddingObject>,
    model: String,
    usage: Usage,
}

#[allow(dead_code)]
#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    object: String,
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embeds_batch() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "model": "text-embedding-3-small",
                "data": [
                    {"object": "embedding", "embedding": [0.1, 0.2], "index": 0},
                    {"object": "embedding", "embedding": [0.3, 0.4], "index": 1},
                ],
                "usage": {"prompt_tokens": 4, "total_tokens": 4}
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(Some(&server.uri()), "sk-test");
        let result = embedder
            .embed(&["hello", "world"], "text-embedding-3-small")
            .await
            .unwrap();

        assert_eq!(result, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[tokio::test]
    async fn surfaces_http_error_with_truncated_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(Some(&server.uri()), "bad-key");
        let err = embedder.embed(&["hi"], "text-embedding-3-small").await.unwrap_err();

        match err {
            EmbeddingError::Provider { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
