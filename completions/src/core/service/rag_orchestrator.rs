use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::core::connector::{ConnectRequest, ConnectorRegistry, ConnectorResponse};
use crate::core::kb_client::{KbClient, RagDocument};
use crate::core::model::assistant::Assistant;
use crate::core::model::chat::{ChatCompletionChunk, ChatMessage};
use crate::core::model::org::DEFAULT_SETUP;
use crate::core::prompt::{PromptProcessor, SimpleAugmentProcessor};
use crate::core::provider::DirectoryLookup;
use crate::core::service::org_config_resolver::OrgConfigResolver;
use crate::error::{CompletionErr, CompletionError};
use crate::err;

/// RAG Orchestrator (§4.7): loads the assistant, resolves its owner's
/// effective org config, fans a similarity query out to every configured
/// collection, runs the named prompt processor, and dispatches to the
/// named connector. `kb`'s nearest analogue is [crate::core::service::ingest::IngestService]
/// — a multi-step pipeline gluing together several traits behind one
/// `run`-shaped entry point.
pub struct RagOrchestrator<D, K> {
    directory: Arc<D>,
    resolver: OrgConfigResolver<D>,
    kb_client: K,
    connectors: Arc<ConnectorRegistry>,
}

/// Per-collection RAG fan-out outcome, surfaced in the final response so a
/// caller can see which collections failed without the whole request
/// failing (§4.7 "RAG fan-out").
#[derive(Debug, Clone)]
pub struct RagCitation {
    pub collection_id: String,
    pub documents: Vec<RagDocument>,
    pub error: Option<String>,
}

pub enum OrchestratorResponse {
    Buffered(ChatCompletionChunk),
    Stream(crate::core::connector::ChunkStream),
}

impl<D, K> RagOrchestrator<D, K>
where
    D: DirectoryLookup + Send + Sync,
    K: KbClient + Send + Sync,
{
    pub fn new(directory: Arc<D>, defaults: Arc<tokio::sync::RwLock<crate::core::model::org::ProcessDefaults>>, kb_client: K, connectors: Arc<ConnectorRegistry>) -> Self {
        Self {
            resolver: OrgConfigResolver::new(directory.clone(), defaults),
            directory,
            kb_client,
            connectors,
        }
    }

    /// `Run(assistant_id, request, headers)` (§4.7 steps a-g).
    pub async fn run(&self, assistant_id: i64, messages: Vec<ChatMessage>, stream: bool, body: Value) -> Result<(OrchestratorResponse, Vec<RagCitation>), CompletionError> {
        let assistant = self.directory.get_assistant(assistant_id).await?;
        let resolved = self.resolver.resolve(&assistant.owner, DEFAULT_SETUP).await?;

        let (augmented_messages, citations) = if assistant.rag_disabled() {
            (messages, Vec::new())
        } else {
            let last_user_content = messages
                .iter()
                .rev()
                .find(|m| m.role == "user")
                .map(|m| m.content.clone())
                .unwrap_or_default();

            let citations = self.query_collections(&assistant, &resolved, &last_user_content).await;

            if !citations.is_empty() && citations.iter().all(|c| c.error.is_some()) {
                warn!(assistant_id, "every rag collection failed");
            }

            let rag_context = rag_context_json(&citations);
            let processor = SimpleAugmentProcessor;
            let augmented = processor.process(messages, &assistant, &rag_context)?;
            (augmented, citations)
        };

        let provider = resolved.provider(&assistant.connector_name).cloned().ok_or_else(|| {
            CompletionError::new(
                file!(),
                line!(),
                column!(),
                CompletionErr::Config(format!("no provider configured for connector '{}'", assistant.connector_name)),
            )
        })?;

        let connector = self.connectors.get(&assistant.connector_name)?;

        info!(assistant_id, connector = %assistant.connector_name, llm = %assistant.llm_name, stream, "dispatching completion");

        let response = connector
            .connect(ConnectRequest {
                messages: augmented_messages,
                stream,
                body,
                llm: assistant.llm_name.clone(),
                assistant_owner: assistant.owner.clone(),
                provider,
            })
            .await?;

        let response = match response {
            ConnectorResponse::Buffered(chunk) => OrchestratorResponse::Buffered(chunk),
            ConnectorResponse::Stream(s) => OrchestratorResponse::Stream(s),
        };

        Ok((response, citations))
    }

    async fn query_collections(&self, assistant: &Assistant, resolved: &crate::core::model::org::ResolvedConfig, query_text: &str) -> Vec<RagCitation> {
        if query_text.trim().is_empty() {
            return Vec::new();
        }

        let collection_ids = assistant.rag_collection_ids();
        let futures = collection_ids.into_iter().map(|collection_id| {
            let kb = &resolved.knowledge_base;
            async move {
                match self
                    .kb_client
                    .query(&kb.server_url, &kb.api_token, &collection_id, query_text, assistant.rag_top_k)
                    .await
                {
                    Ok(documents) => RagCitation {
                        collection_id,
                        documents,
                        error: None,
                    },
                    Err(e) => {
                        warn!(collection_id, error = %e, "rag query failed for collection");
                        RagCitation {
                            collection_id,
                            documents: Vec::new(),
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
        });

        join_all(futures).await
    }
}

fn rag_context_json(citations: &[RagCitation]) -> Value {
    if citations.is_empty() {
        return Value::Null;
    }
    json!(citations
        .iter()
        .flat_map(|c| c.documents.iter())
        .map(|d| json!({"collection_id": d.collection_id, "text": d.text, "similarity": d.similarity}))
        .collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::org::{KnowledgeBaseConfig, ProcessDefaults, ProviderConfig};
    use crate::core::provider::StaticDirectory;
    use std::collections::HashMap;

    struct StubKbClient {
        reply: Vec<RagDocument>,
    }

    #[async_trait::async_trait]
    impl KbClient for StubKbClient {
        async fn query(&self, _server_url: &str, _api_token: &str, collection_id: &str, _query_text: &str, _top_k: u32) -> Result<Vec<RagDocument>, CompletionError> {
            Ok(self
                .reply
                .iter()
                .cloned()
                .map(|mut d| {
                    d.collection_id = collection_id.to_string();
                    d
                })
                .collect())
        }
    }

    fn defaults() -> Arc<tokio::sync::RwLock<ProcessDefaults>> {
        let mut providers = HashMap::new();
        providers.insert(
            "bypass".to_string(),
            ProviderConfig {
                models: vec!["bypass-model".into()],
                default_model: Some("bypass-model".into()),
                endpoint: None,
                api_key: None,
            },
        );
        Arc::new(tokio::sync::RwLock::new(ProcessDefaults {
            providers,
            knowledge_base: KnowledgeBaseConfig {
                server_url: "http://kb.local".into(),
                api_token: "tok".into(),
            },
            features: HashMap::new(),
        }))
    }

    #[tokio::test]
    async fn runs_rag_fan_out_and_dispatches_to_connector() {
        let assistant = Assistant {
            id: 1,
            owner: "alice".into(),
            name: "tutor".into(),
            system_prompt: String::new(),
            prompt_template: String::new(),
            rag_processor_name: "simple_rag".into(),
            prompt_processor_name: "simple_augment".into(),
            connector_name: "bypass".into(),
            llm_name: "bypass-model".into(),
            rag_collections: "col-1".into(),
            rag_top_k: 5,
            metadata: Value::Null,
        };
        let directory = Arc::new(StaticDirectory::new("system").with_assistant(assistant));
        let kb_client = StubKbClient {
            reply: vec![RagDocument {
                collection_id: String::new(),
                similarity: 0.9,
                text: "relevant text".into(),
                metadata: Value::Null,
            }],
        };
        let mut connectors = ConnectorRegistry::new();
        connectors.register(Arc::new(crate::core::connectors::bypass::BypassConnector));

        let orchestrator = RagOrchestrator::new(directory, defaults(), kb_client, Arc::new(connectors));

        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: "hello".to_string(),
        }];
        let (response, citations) = orchestrator.run(1, messages, false, Value::Null).await.unwrap();

        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].documents[0].text, "relevant text");
        match response {
            OrchestratorResponse::Buffered(chunk) => {
                assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("hello"));
            }
            OrchestratorResponse::Stream(_) => panic!("expected buffered response"),
        }
    }
}
