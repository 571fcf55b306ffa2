//! Request/response bodies for the completion API (§6). `ChatCompletionRequest`
//! already lives in [crate::core::model::chat] since its message-resolution
//! logic (§9 Open Question) is core behavior, not wire shape; the DTOs here
//! are purely additive framing around core types.

use serde::{Deserialize, Serialize};

use crate::core::model::chat::ChatCompletionChunk;
use crate::core::service::rag_orchestrator::RagCitation;

#[derive(Debug, Deserialize, Default)]
pub struct ModelsQuery {
    pub owner: Option<String>,
}

/// One collection's outcome in a RAG fan-out (§4.7 "RAG fan-out"), surfaced
/// alongside a buffered completion so a caller can see a partial failure
/// without the request itself failing.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CitationSummary {
    pub collection_id: String,
    pub document_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&RagCitation> for CitationSummary {
    fn from(c: &RagCitation) -> Self {
        Self {
            collection_id: c.collection_id.clone(),
            document_count: c.documents.len(),
            error: c.error.clone(),
        }
    }
}

/// Buffered `POST /v1/chat/completions` response body: the normalized
/// chunk schema (§4.8) plus the RAG fan-out summary, flattened so a
/// strictly OpenAI-compatible client can still parse the response.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    #[serde(flatten)]
    pub chunk: ChatCompletionChunk,
    #[serde(rename = "lamb_rag_citations", skip_serializing_if = "Vec::is_empty")]
    pub citations: Vec<CitationSummary>,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
