use std::sync::Arc;
use std::time::Instant;

use kb_embedders::{Embedder, ProviderDescriptor};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::core::plugin::PluginRegistry;
use crate::core::repo::collection::CollectionRepo;
use crate::core::vector::VectorDb;
use crate::error::KbError;
use crate::err;

/// One hit in a [QueryResponse], normalized from a [crate::core::vector::VectorHit].
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub similarity: f32,
    pub data: String,
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub metadata: serde_json::Map<String, Value>,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct QueryTiming {
    pub total_seconds: f64,
    pub total_ms: u128,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub results: Vec<QueryResult>,
    pub count: usize,
    pub timing: QueryTiming,
    pub query: String,
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub embeddings_model: ProviderDescriptor,
}

/// Query Service (§4.5). Generic over the repo only for [CollectionRepo] —
/// queries never touch the file registry.
#[derive(Clone)]
pub struct QueryService<R> {
    repo: R,
    vector: Arc<dyn VectorDb + Send + Sync>,
    plugins: Arc<PluginRegistry>,
}

impl<R> QueryService<R>
where
    R: CollectionRepo + Clone + Send + Sync,
{
    pub fn new(repo: R, vector: Arc<dyn VectorDb + Send + Sync>, plugins: Arc<PluginRegistry>) -> Self {
        Self {
            repo,
            vector,
            plugins,
        }
    }

    /// `Query` (§4.5). `top_k`/`threshold` come from `plugin_params` via the
    /// named query plugin's `Resolve`, defaulting per `simple_query`
    /// (`top_k=5, threshold=0.0`) when the caller passes neither.
    pub async fn query(
        &self,
        collection_id: Uuid,
        query_text: &str,
        plugin_name: &str,
        plugin_params: &Value,
    ) -> Result<QueryResponse, KbError> {
        if query_text.trim().is_empty() {
            return err!(BadInput, "query_text must not be empty or whitespace");
        }

        let collection = self
            .repo
            .get_by_id(collection_id)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(collection_id.to_string())))?;

        let query_plugin = self.plugins.get_query(plugin_name)?;
        let params = query_plugin.resolve(plugin_params)?;

        if params.top_k == 0 {
            return Ok(QueryResponse {
                results: vec![],
                count: 0,
                timing: QueryTiming {
                    total_seconds: 0.0,
                    total_ms: 0,
                },
                query: query_text.to_string(),
                embeddings_model: collection.embeddings_model,
            });
        }

        let embedder = Embedder::build(&collection.embeddings_model)
            .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;

        let start = Instant::now();

        let vectors = embedder
            .embed(&[query_text], &collection.embeddings_model.model)
            .await
            .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::Embedding(kb_embedders::EmbeddingError::InvalidModel(collection.embeddings_model.model.clone()))))?;

        let hits = self
            .vector
            .query(&collection.vector_uuid, query_vector, params.top_k)
            .await?;

        let elapsed = start.elapsed();

        let mut results: Vec<QueryResult> = hits
            .into_iter()
            .map(|hit| QueryResult {
                similarity: 1.0 - hit.distance,
                data: hit.text,
                metadata: hit.metadata,
            })
            .filter(|r| r.similarity >= params.threshold)
            .collect();

        results.sort_by(|a, b| b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(params.top_k as usize);

        Ok(QueryResponse {
            count: results.len(),
            results,
            timing: QueryTiming {
                total_seconds: elapsed.as_secs_f64(),
                total_ms: elapsed.as_millis(),
            },
            query: query_text.to_string(),
            embeddings_model: collection.embeddings_model,
        })
    }
}
