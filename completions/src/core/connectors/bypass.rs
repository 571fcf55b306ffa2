use futures_util::stream;

use crate::core::connector::{ConnectRequest, Connector, ConnectorResponse};
use crate::core::model::chat::ChatCompletionChunk;
use crate::error::CompletionError;

/// Deterministic connector used by tests and local development: echoes the
/// last user message back as the completion, with no outbound network call.
/// Grounded on the mock/bypass embedder pattern in `kb_embedders` (a
/// no-op provider kept alongside the real ones for wiring tests without
/// network access).
pub struct BypassConnector;

#[async_trait::async_trait]
impl Connector for BypassConnector {
    fn name(&self) -> &'static str {
        "bypass"
    }

    async fn connect(&self, request: ConnectRequest) -> Result<ConnectorResponse, CompletionError> {
        let echoed = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let id = uuid::Uuid::new_v4().to_string();

        if !request.stream {
            return Ok(ConnectorResponse::Buffered(ChatCompletionChunk::single(
                id,
                request.llm.clone(),
                echoed,
            )));
        }

        let model = request.llm.clone();
        let chunks: Vec<Result<ChatCompletionChunk, CompletionError>> = echoed
            .split_whitespace()
            .map(|word| Ok(ChatCompletionChunk::delta(id.clone(), model.clone(), format!("{word} "))))
            .collect();

        Ok(ConnectorResponse::Stream(Box::pin(stream::iter(chunks))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::chat::ChatMessage;

    #[tokio::test]
    async fn echoes_last_user_message() {
        let connector = BypassConnector;
        let response = connector
            .connect(ConnectRequest {
                messages: vec![ChatMessage::system("sys"), ChatMessage {
                    role: "user".to_string(),
                    content: "hello world".to_string(),
                }],
                stream: false,
                body: serde_json::Value::Null,
                llm: "bypass-model".to_string(),
                assistant_owner: "alice".to_string(),
                provider: Default::default(),
            })
            .await
            .unwrap();

        match response {
            ConnectorResponse::Buffered(chunk) => {
                assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("hello world"));
            }
            ConnectorResponse::Stream(_) => panic!("expected buffered response"),
        }
    }
}
