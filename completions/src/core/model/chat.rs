use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One OpenAI-style chat message.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// `POST /v1/chat/completions` body (§6). The original accepts `messages`,
/// `prompt`, or `params.prompt`; [ChatCompletionRequest::messages] folds
/// all three into one message list.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub params: Option<ChatCompletionParams>,
    #[serde(default)]
    pub stream: bool,
    /// Every body field besides the ones above (e.g. `max_tokens`,
    /// `temperature`), passed through to the connector's provider request
    /// unchanged (§4.8 `body`).
    #[serde(flatten)]
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub extra: Value,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionParams {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ChatCompletionRequest {
    /// Resolves the effective message list per the Open Question in §9:
    /// `messages` wins if non-empty, then `prompt`, then `params.prompt`.
    pub fn resolved_messages(&self) -> Vec<ChatMessage> {
        if !self.messages.is_empty() {
            return self.messages.clone();
        }
        let prompt = self
            .prompt
            .clone()
            .or_else(|| self.params.as_ref().and_then(|p| p.prompt.clone()))
            .unwrap_or_default();
        vec![ChatMessage {
            role: "user".to_string(),
            content: prompt,
        }]
    }
}

/// Normalized chat-completion chunk (§4.8), matching the OpenAI streaming
/// schema exactly so a client speaking that protocol can't tell the
/// difference between connectors.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: &'static str,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkChoice {
    pub index: u32,
    pub delta: ChunkDelta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChunkDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// A single chunk carrying a complete (non-streaming) response, used
    /// by connectors for buffered calls and for the catch-all error chunk
    /// every connector falls back to on an upstream failure (§4.8, §7).
    pub fn single(id: impl Into<String>, model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "chat.completion.chunk",
            created: 0,
            model: model.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: Some("assistant".to_string()),
                    content: Some(content.into()),
                },
                finish_reason: Some("stop".to_string()),
            }],
        }
    }

    /// A chunk carrying only a content delta, with no `finish_reason` —
    /// the shape every intermediate streamed token uses.
    pub fn delta(id: impl Into<String>, model: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "chat.completion.chunk",
            created: 0,
            model: model.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta {
                    role: None,
                    content: Some(content.into()),
                },
                finish_reason: None,
            }],
        }
    }

    /// The sentinel final chunk: no content, `finish_reason = "stop"`,
    /// immediately followed on the wire by `data: [DONE]` (§4.8, §7).
    pub fn stop(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            object: "chat.completion.chunk",
            created: 0,
            model: model.into(),
            choices: vec![ChunkChoice {
                index: 0,
                delta: ChunkDelta::default(),
                finish_reason: Some("stop".to_string()),
            }],
        }
    }

    /// SSE wire form of this chunk: `data: {...}\n\n`.
    pub fn to_sse(&self) -> String {
        format!("data: {}\n\n", serde_json::to_string(self).unwrap_or_default())
    }
}

/// Literal terminal frame every streaming completion ends with (§4.8, §7),
/// in every exit path: success, upstream error, or cancellation.
pub const SSE_DONE: &str = "data: [DONE]\n\n";

/// One entry of `GET /v1/models` (§2 supplement, §6).
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct ModelDescriptor {
    pub id: String,
    pub object: &'static str,
    pub owned_by: String,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct ModelList {
    pub object: &'static str,
    pub data: Vec<ModelDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_messages_priority() {
        let req = ChatCompletionRequest {
            model: "lamb_assistant.1".into(),
            messages: vec![],
            prompt: Some("from prompt".into()),
            params: Some(ChatCompletionParams {
                prompt: Some("from params".into()),
            }),
            stream: false,
            extra: Value::Null,
        };
        assert_eq!(req.resolved_messages()[0].content, "from prompt");

        let req2 = ChatCompletionRequest {
            prompt: None,
            ..req
        };
        assert_eq!(req2.resolved_messages()[0].content, "from params");
    }

    #[test]
    fn stop_chunk_carries_no_content() {
        let chunk = ChatCompletionChunk::stop("abc", "gpt-4o-mini");
        assert_eq!(chunk.choices[0].finish_reason.as_deref(), Some("stop"));
        assert!(chunk.choices[0].delta.content.is_none());
    }
}
