use serde_json::Value;

use crate::error::CompletionError;

/// One retrieved chunk, normalized from `kb`'s `QueryResult` (§4.5) into
/// the shape the RAG orchestrator merges across collections.
#[derive(Debug, Clone)]
pub struct RagDocument {
    pub collection_id: String,
    pub similarity: f32,
    pub text: String,
    pub metadata: Value,
}

/// The RAG fan-out's only outbound dependency: one similarity query against
/// one `kb` collection (§4.7 step c). `kb` and `completions` are two
/// separate processes (§1) talking over `kb`'s own HTTP API (§6); this
/// trait is the seam, with [crate::app::kb_client::HttpKbClient] the real
/// `reqwest`-based implementation.
#[async_trait::async_trait]
pub trait KbClient {
    async fn query(
        &self,
        server_url: &str,
        api_token: &str,
        collection_id: &str,
        query_text: &str,
        top_k: u32,
    ) -> Result<Vec<RagDocument>, CompletionError>;
}
