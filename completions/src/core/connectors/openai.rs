use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::core::connector::{resolve_model, ConnectRequest, Connector, ConnectorResponse};
use crate::core::model::chat::{ChatCompletionChunk, ChunkChoice, ChunkDelta};
use crate::error::{CompletionErr, CompletionError};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com";

/// OpenAI-compatible connector (§4.8): bearer auth, SSE `data: {...}` framing
/// on the wire in, re-emitted as our own normalized [ChatCompletionChunk]s
/// on the wire out. Grounded on the embedding layer's request/response
/// shape in `kb_embedders::openai`, extended to the chat-completions
/// endpoint and its streaming variant. Holds no credentials itself — those
/// come from the resolved [crate::core::model::org::ProviderConfig] on
/// each [ConnectRequest] (§4.6).
#[derive(Default)]
pub struct OpenAiConnector {
    client: reqwest::Client,
}

impl OpenAiConnector {
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
impl Connector for OpenAiConnector {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn connect(&self, request: ConnectRequest) -> Result<ConnectorResponse, CompletionError> {
        let model = resolve_model(&request.provider, &request.llm)?;

        let key = request.provider.api_key.as_deref().ok_or_else(|| {
            CompletionError::new(file!(), line!(), column!(), CompletionErr::Config("openai provider has no api_key configured".to_string()))
        })?;

        let endpoint = request.provider.endpoint.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let mut body = json!({
            "model": model,
            "messages": request.messages,
            "stream": request.stream,
        });
        if let Value::Object(extra) = &request.body {
            if let Value::Object(map) = &mut body {
                for (k, v) in extra {
                    map.insert(k.clone(), v.clone());
                }
            }
        }

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", endpoint.trim_end_matches('/')))
            .bearer_auth(key)
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
                CompletionErr::Provider(format!("openai {status}: {}", text.chars().take(500).collect::<String>())),
            ));
        }

        if !request.stream {
            let parsed: OpenAiChatResponse = response
                .json()
                .await
                .map_err(|e| CompletionError::new(file!(), line!(), column!(), CompletionErr::Reqwest(e)))?;
            let content = parsed
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content)
                .unwrap_or_default();
            return Ok(ConnectorResponse::Buffered(ChatCompletionChunk::single(
                parsed.id,
                model,
                content,
            )));
        }

        let model_for_stream = model.clone();
        let byte_stream = response.bytes_stream();
        let stream = byte_stream.flat_map(move |chunk_result| {
            let frames = match chunk_result {
                Ok(bytes) => parse_sse_frames(&String::from_utf8_lossy(&bytes), &model_for_stream),
                Err(e) => vec![Err(CompletionError::new(file!(), line!(), column!(), CompletionErr::Reqwest(e)))],
            };
            futures_util::stream::iter(frames)
        });

        Ok(ConnectorResponse::Stream(Box::pin(stream)))
    }
}

/// Translates a raw SSE buffer (possibly several `data:` lines) into zero or
/// more normalized chunks, dropping the terminal `[DONE]` marker since the
/// HTTP layer appends its own.
fn parse_sse_frames(buf: &str, model: &str) -> Vec<Result<ChatCompletionChunk, CompletionError>> {
    let mut out = Vec::new();
    for line in buf.lines() {
        let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) else {
            continue;
        };
        let data = data.trim();
        if data.is_empty() || data == "[DONE]" {
            continue;
        }
        match serde_json::from_str::<OpenAiStreamChunk>(data) {
            Ok(parsed) => {
                let choice = parsed.choices.into_iter().next().unwrap_or_default();
                out.push(Ok(ChatCompletionChunk {
                    id: parsed.id,
                    object: "chat.completion.chunk",
                    created: 0,
                    model: model.to_string(),
                    choices: vec![ChunkChoice {
                        index: choice.index,
                        delta: ChunkDelta {
                            role: choice.delta.role,
                            content: choice.delta.content,
                        },
                        finish_reason: choice.finish_reason,
                    }],
                }));
            }
            Err(e) => debug!(error = %e, "skipping malformed openai sse frame"),
        }
    }
    out
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    id: String,
    choices: Vec<OpenAiChatChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatChoice {
    message: OpenAiChatMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiStreamChunk {
    #[serde(default)]
    id: String,
    #[serde(default)]
    choices: Vec<OpenAiStreamChoice>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiStreamChoice {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    delta: OpenAiStreamDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAiStreamDelta {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::chat::ChatMessage;
    use crate::core::model::org::ProviderConfig;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(endpoint: &str) -> ProviderConfig {
        ProviderConfig {
            models: vec!["gpt-4o-mini".to_string()],
            default_model: Some("gpt-4o-mini".to_string()),
            endpoint: Some(endpoint.to_string()),
            api_key: Some("sk-test".to_string()),
        }
    }

    #[tokio::test]
    async fn buffered_completion_returns_single_chunk() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "chatcmpl-1",
                "choices": [{"message": {"content": "hi there"}}]
            })))
            .mount(&server)
            .await;

        let connector = OpenAiConnector::new();
        let response = connector
            .connect(ConnectRequest {
                messages: vec![ChatMessage::system("be nice")],
                stream: false,
                body: Value::Null,
                llm: "gpt-4o-mini".to_string(),
                assistant_owner: "alice".to_string(),
                provider: provider(&server.uri()),
            })
            .await
            .unwrap();

        match response {
            ConnectorResponse::Buffered(chunk) => {
                assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("hi there"));
            }
            ConnectorResponse::Stream(_) => panic!("expected buffered response"),
        }
    }

    #[test]
    fn parses_sse_frame_into_chunk() {
        let buf = "data: {\"id\":\"c1\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"hey\"}}]}\n\ndata: [DONE]\n\n";
        let frames = parse_sse_frames(buf, "gpt-4o-mini");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].as_ref().unwrap().choices[0].delta.content.as_deref(), Some("hey"));
    }
}
