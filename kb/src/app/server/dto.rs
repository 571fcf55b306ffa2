//! Request/response bodies for the HTTP API (§6). These are distinct from
//! the core model DTOs: a few wrap them verbatim, others merge query-string
//! parameters with a JSON body into the shape the core services expect.

use kb_embedders::ProviderDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::model::collection::Visibility;
use crate::core::model::file_registry::{FileStatus, IngestChunk};

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct CreateCollectionPayload {
    pub name: String,
    pub description: Option<String>,
    pub owner: String,
    pub visibility: Visibility,
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    #[serde(default)]
    pub embeddings_model: ProviderDescriptor,
}

fn default_limit() -> i64 {
    20
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct CollectionListQuery {
    pub owner: Option<String>,
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

impl Default for CollectionListQuery {
    fn default() -> Self {
        Self {
            owner: None,
            visibility: None,
            skip: 0,
            limit: default_limit(),
        }
    }
}

/// `POST /collections/{id}/ingest-url` body. `urls` is merged into
/// `plugin_params` under the `urls` key before being handed to
/// `url_ingest` (or whichever plugin `plugin_name` names).
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct IngestUrlPayload {
    pub urls: Vec<String>,
    pub plugin_name: Option<String>,
    #[serde(default)]
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub plugin_params: Value,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct IngestBasePayload {
    pub plugin_name: String,
    #[serde(default)]
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub plugin_params: Value,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct AddDocumentsPayload {
    pub documents: Vec<IngestChunk>,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct AddDocumentsResponse {
    pub documents_added: usize,
    pub success: bool,
}

/// `POST /collections/{id}/query` body. `top_k`/`threshold` are merged
/// into `plugin_params` (as `top_k`/`threshold`, matching `simple_query`'s
/// parameter names) before the named query plugin resolves them.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize)]
pub struct QueryPayload {
    pub query_text: String,
    pub top_k: Option<u32>,
    pub threshold: Option<f32>,
    #[serde(default)]
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub plugin_params: Value,
}

impl QueryPayload {
    /// Folds `top_k`/`threshold` into `plugin_params`, which callers may
    /// also have set directly; the explicit fields win on conflict.
    pub fn merged_plugin_params(&self) -> Value {
        let mut params = match &self.plugin_params {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        if let Some(top_k) = self.top_k {
            params.insert("top_k".to_string(), Value::from(top_k));
        }
        if let Some(threshold) = self.threshold {
            params.insert("threshold".to_string(), Value::from(threshold));
        }
        Value::Object(params)
    }
}

#[derive(Debug, Deserialize)]
pub struct PluginNameQuery {
    #[serde(default = "default_query_plugin")]
    pub plugin_name: String,
}

fn default_query_plugin() -> String {
    "simple_query".to_string()
}

#[derive(Debug, Deserialize, Default)]
pub struct FileListQuery {
    pub status: Option<FileStatus>,
}

#[derive(Debug, Deserialize, Default)]
pub struct DeleteFileQuery {
    #[serde(default)]
    pub hard: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateQuery {
    pub status: String,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
