use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::Stream;
use serde_json::Value;
use tracing::{info, warn};

use crate::core::model::chat::{ChatCompletionChunk, ChatMessage};
use crate::core::model::org::ProviderConfig;
use crate::error::CompletionError;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<ChatCompletionChunk, CompletionError>> + Send>>;

/// The call a connector receives from the RAG orchestrator (§4.7 step f,
/// §4.8). `provider` is the resolved per-tenant [ProviderConfig] (§4.6) for
/// this connector's vendor — connectors hold no credentials of their own,
/// since the same `openai` connector instance serves every organization's
/// distinct API key.
#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub body: Value,
    pub llm: String,
    pub assistant_owner: String,
    pub provider: ProviderConfig,
}

/// A connector's response is either one buffered chunk or a stream of
/// them; the HTTP layer renders the latter as SSE frames terminated by
/// `[DONE]` (§4.8).
pub enum ConnectorResponse {
    Buffered(ChatCompletionChunk),
    Stream(ChunkStream),
}

/// Uniform contract over provider backends (§4.8). Each connector owns
/// mapping its provider's errors to the normalized chunk schema, enforcing
/// the 120s timeout, and honoring cancellation — concretely, by building
/// its HTTP client with a request timeout and letting the returned stream
/// be dropped on client disconnect, the same mechanism `axum`'s streaming
/// response bodies already provide.
#[async_trait::async_trait]
pub trait Connector {
    fn name(&self) -> &'static str;

    async fn connect(&self, request: ConnectRequest) -> Result<ConnectorResponse, CompletionError>;
}

/// Model resolution and fallback (§4.8): the requested model if the
/// provider allows it, else the provider's default, else its first
/// configured model, else a config error. Every connector calls this
/// before dispatching so the fallback is uniform and the decision is
/// logged once regardless of which connector made it.
pub fn resolve_model(provider: &ProviderConfig, requested: &str) -> Result<String, CompletionError> {
    if provider.models.iter().any(|m| m == requested) {
        return Ok(requested.to_string());
    }

    if let Some(default) = &provider.default_model {
        warn!(requested, fallback = %default, "llm not configured for provider, using default_model");
        return Ok(default.clone());
    }

    if let Some(first) = provider.models.first() {
        warn!(requested, fallback = %first, "llm and default_model unavailable, using first configured model");
        return Ok(first.clone());
    }

    Err(CompletionError::new(
        file!(),
        line!(),
        column!(),
        crate::error::CompletionErr::Config(format!("no models configured for provider, requested '{requested}'")),
    ))
}

/// Holds every registered connector by name, built once at startup.
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: HashMap<&'static str, Arc<dyn Connector + Send + Sync>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connector: Arc<dyn Connector + Send + Sync>) {
        info!(connector = connector.name(), "registered connector");
        self.connectors.insert(connector.name(), connector);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Connector + Send + Sync>, CompletionError> {
        self.connectors.get(name).cloned().ok_or_else(|| {
            CompletionError::new(
                file!(),
                line!(),
                column!(),
                crate::error::CompletionErr::Config(format!("no such connector '{name}'")),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(models: &[&str], default: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            models: models.iter().map(|s| s.to_string()).collect(),
            default_model: default.map(String::from),
            endpoint: None,
            api_key: None,
        }
    }

    #[test]
    fn uses_requested_model_when_available() {
        let p = provider(&["gpt-4o-mini", "gpt-4o"], Some("gpt-4o"));
        assert_eq!(resolve_model(&p, "gpt-4o-mini").unwrap(), "gpt-4o-mini");
    }

    #[test]
    fn falls_back_to_default_model() {
        let p = provider(&["gpt-4o-mini", "gpt-4o"], Some("gpt-4o"));
        assert_eq!(resolve_model(&p, "gpt-5").unwrap(), "gpt-4o");
    }

    #[test]
    fn falls_back_to_first_model_without_default() {
        let p = provider(&["gpt-4o-mini", "gpt-4o"], None);
        assert_eq!(resolve_model(&p, "gpt-5").unwrap(), "gpt-4o-mini");
    }

    #[test]
    fn fails_with_no_models_configured() {
        let p = provider(&[], None);
        assert!(resolve_model(&p, "gpt-5").is_err());
    }
}
