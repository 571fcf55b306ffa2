use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::core::connector::{resolve_model, ConnectRequest, Connector, ConnectorResponse};
use crate::core::model::chat::ChatCompletionChunk;
use crate::error::{CompletionErr, CompletionError};

const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama connector (§4.8). Same shape as [super::openai::OpenAiConnector]
/// but Ollama streams newline-delimited JSON objects rather than SSE, and
/// takes no auth header — differences isolated entirely to this file so the
/// rest of the pipeline never cares which wire format a given LLM vendor
/// speaks.
#[derive(Default)]
pub struct OllamaConnector {
    client: reqwest::Client,
}

impl OllamaConnector {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl Connector for OllamaConnector {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn connect(&self, request: ConnectRequest) -> Result<ConnectorResponse, CompletionError> {
        let model = resolve_model(&request.provider, &request.llm)?;
        let endpoint = request.provider.endpoint.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let body = json!({
            "model": model,
            "messages": request.messages,
            "stream": request.stream,
        });

        let response = self
            .client
            .post(format!("{}/api/chat", endpoint.trim_end_matches('/')))
            .json(&body)
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
                CompletionErr::Provider(format!("ollama {status}: {}", text.chars().take(500).collect::<String>())),
            ));
        }

        if !request.stream {
            let parsed: OllamaResponse = response
                .json()
                .await
                .map_err(|e| CompletionError::new(file!(), line!(), column!(), CompletionErr::Reqwest(e)))?;
            return Ok(ConnectorResponse::Buffered(ChatCompletionChunk::single(
                uuid::Uuid::new_v4().to_string(),
                model,
                parsed.message.content,
            )));
        }

        let model_for_stream = model.clone();
        let byte_stream = response.bytes_stream();
        let stream = byte_stream.flat_map(move |chunk_result| {
            let frames = match chunk_result {
                Ok(bytes) => parse_ndjson(&String::from_utf8_lossy(&bytes), &model_for_stream),
                Err(e) => vec![Err(CompletionError::new(file!(), line!(), column!(), CompletionErr::Reqwest(e)))],
            };
            futures_util::stream::iter(frames)
        });

        Ok(ConnectorResponse::Stream(Box::pin(stream)))
    }
}

/// Each line of an Ollama stream is a standalone JSON object; translates
/// each into a normalized delta chunk, skipping the final `"done": true`
/// line since `stop()` is synthesized by the RAG orchestrator instead.
fn parse_ndjson(buf: &str, model: &str) -> Vec<Result<ChatCompletionChunk, CompletionError>> {
    let mut out = Vec::new();
    for line in buf.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<OllamaStreamLine>(line) {
            Ok(parsed) => {
                if parsed.done {
                    continue;
                }
                out.push(Ok(ChatCompletionChunk::delta(
                    uuid::Uuid::new_v4().to_string(),
                    model.to_string(),
                    parsed.message.content,
                )));
            }
            Err(e) => debug!(error = %e, "skipping malformed ollama ndjson line"),
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaStreamLine {
    message: OllamaMessage,
    #[serde(default)]
    done: bool,
}

#[derive(Debug, Default, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ndjson_lines_skipping_done() {
        let buf = "{\"message\":{\"content\":\"hel\"},\"done\":false}\n{\"message\":{\"content\":\"lo\"},\"done\":false}\n{\"message\":{\"content\":\"\"},\"done\":true}\n";
        let frames = parse_ndjson(buf, "llama3");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].as_ref().unwrap().choices[0].delta.content.as_deref(), Some("hel"));
        assert_eq!(frames[1].as_ref().unwrap().choices[0].delta.content.as_deref(), Some("lo"));
    }
}
