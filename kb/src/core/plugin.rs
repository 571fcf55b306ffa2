use crate::core::model::file_registry::IngestChunk;
use crate::error::KbError;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Distinguishes how an ingestion plugin is invoked (§2, §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginKind {
    /// Operates on an uploaded file (`simple_ingest`, `markitdown_ingest`, `mockai_json_ingest`).
    FileIngest,
    /// Operates on catalog-supplied text with no upload (`POST /collections/{id}/documents`).
    BaseIngest,
    /// Operates on a remote resource the plugin fetches itself (`url_ingest`, `youtube_transcript_ingest`).
    RemoteIngest,
}

/// An interchangeable ingestion processor. Plugins are pure with respect to
/// the catalog and vector store: they never open either, they only turn
/// raw input into chunks.
#[async_trait::async_trait]
pub trait IngestPlugin {
    fn name(&self) -> &'static str;

    fn kind(&self) -> PluginKind;

    fn description(&self) -> &'static str;

    /// File extensions this plugin accepts, without the leading dot.
    /// Empty for plugins that don't operate on uploaded files.
    fn supported_file_types(&self) -> &'static [&'static str];

    /// JSON schema of the plugin's `params` argument.
    fn parameters(&self) -> Value;

    /// Turn `file_path` (present for file-ingest plugins) and `params` into
    /// chunks. `params` has already been merged with `{file_url}` by the
    /// caller for remote/file plugins that need it (§4.4 step f).
    async fn ingest(
        &self,
        file_path: Option<&str>,
        params: &Value,
    ) -> Result<Vec<IngestChunk>, KbError>;
}

/// An interchangeable query parameter resolver. Unlike [IngestPlugin], the
/// actual embedding/vector-store work is performed by the query service;
/// a `QueryPlugin` only validates and defaults its parameters.
pub trait QueryPlugin {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameters(&self) -> Value;

    /// Resolve `params` into the bounds the query service applies.
    fn resolve(&self, params: &Value) -> Result<QueryParams, KbError>;
}

/// Resolved `{top_k, threshold}` bounds for a query (§4.5).
#[derive(Debug, Clone, Copy)]
pub struct QueryParams {
    pub top_k: u32,
    pub threshold: f32,
}

/// Metadata shown by `GET /ingestion/plugins` / `GET /query/plugins` (§6).
#[derive(Debug, Serialize)]
pub struct PluginMetadata {
    pub name: &'static str,
    pub kind: Option<PluginKind>,
    pub description: &'static str,
    pub supported_file_types: &'static [&'static str],
    pub parameters: Value,
}

/// Holds the enabled ingestion and query plugins, keyed by name. Built once
/// at startup from the built-in set filtered by `disabled_plugins`
/// (§9 "dynamic plugin discovery").
#[derive(Clone, Default)]
pub struct PluginRegistry {
    ingest: HashMap<&'static str, Arc<dyn IngestPlugin + Send + Sync>>,
    query: HashMap<&'static str, Arc<dyn QueryPlugin + Send + Sync>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_ingest(&mut self, plugin: Arc<dyn IngestPlugin + Send + Sync>) {
        self.ingest.insert(plugin.name(), plugin);
    }

    pub fn register_query(&mut self, plugin: Arc<dyn QueryPlugin + Send + Sync>) {
        self.query.insert(plugin.name(), plugin);
    }

    pub fn get_ingest(&self, name: &str) -> Result<Arc<dyn IngestPlugin + Send + Sync>, KbError> {
        self.ingest
            .get(name)
            .cloned()
            .ok_or_else(|| crate::error::KbError::new(
                file!(),
                line!(),
                column!(),
                crate::error::KbErr::Plugin(format!("no such ingestion plugin '{name}'")),
            ))
    }

    pub fn get_query(&self, name: &str) -> Result<Arc<dyn QueryPlugin + Send + Sync>, KbError> {
        self.query
            .get(name)
            .cloned()
            .ok_or_else(|| crate::error::KbError::new(
                file!(),
                line!(),
                column!(),
                crate::error::KbErr::Plugin(format!("no such query plugin '{name}'")),
            ))
    }

    pub fn list_ingest(&self) -> Vec<PluginMetadata> {
        self.ingest
            .values()
            .map(|p| PluginMetadata {
                name: p.name(),
                kind: Some(p.kind()),
                description: p.description(),
                supported_file_types: p.supported_file_types(),
                parameters: p.parameters(),
            })
            .collect()
    }

    pub fn list_query(&self) -> Vec<PluginMetadata> {
        self.query
            .values()
            .map(|p| PluginMetadata {
                name: p.name(),
                kind: None,
                description: p.description(),
                supported_file_types: &[],
                parameters: p.parameters(),
            })
            .collect()
    }
}
