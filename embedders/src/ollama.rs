use crate::error::EmbeddingError;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// `ollama` vendor: unauthenticated, one embedding request per input string
/// (the `/api/embeddings` endpoint doesn't accept a batch).
pub struct OllamaEmbedder {
    endpoint: String,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn new(endpoint: Option<&str>) -> Self {
        Self {
            endpoint: endpoint
                .map(str::to_string)
                .unwrap_or_else(|| DEFAULT_OLLAMA_ENDPOINT.to_string()),
            client: reqwest::Client::new(),
        }
    }

    pub async fn embed(
        &self,
        content: &[&str],
        model: &str,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut out = Vec::with_capacity(content.len());

        for prompt in content {
            let request = EmbeddingRequest {
                model: model.to_string(),
                prompt: prompt.to_string(),
            };

            let response = self
                .client
                .post(format!(
                    "{}/api/embeddings",
                    self.endpoint.trim_end_matches('/')
                ))
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
            out.push(response.embedding);
        }

        debug!("Embedded {} chunk(s) with '{}' (ollama)", content.len(), model);

        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embeds_one_request_per_input() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.5, 0.6]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(Some(&server.uri()));
        let result = embedder.embed(&["a", "b"], "nomic-embed-text").await.unwrap();

        assert_eq!(result, vec![vec![0.5, 0.6], vec![0.5, 0.6]]);
    }
}
