use std::sync::Arc;

use chrono::Utc;
use kb_embedders::Embedder;
use serde_json::{json, Value};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::document::store::DocumentStore;
use crate::core::document::sha256;
use crate::core::model::file_registry::{
    DeleteFileResponse, FileContent, FileRegistryEntry, FileRegistryInsert, FileStatus, IngestChunk,
    IngestResponse,
};
use crate::core::plugin::{PluginKind, PluginRegistry};
use crate::core::repo::collection::CollectionRepo;
use crate::core::repo::file_registry::FileRegistryRepo;
use crate::core::repo::Atomic;
use crate::core::vector::{
    VectorDb, VectorRecord, FILE_REGISTRY_ID_KEY, META_CHUNKING_STRATEGY, META_CHUNK_COUNT,
    META_CHUNK_INDEX, META_DOCUMENT_ID, META_EMBEDDING_MODEL, META_EMBEDDING_VENDOR, META_FILENAME,
    META_FILE_URL, META_INGESTION_TIMESTAMP, META_SOURCE,
};
use crate::error::KbError;
use crate::err;

/// Chunks are added to the vector store in sub-batches of this size
/// (§4.4 step h) to bound memory and provider request size.
const ADD_BATCH_SIZE: usize = 5;

/// Ingestion Pipeline (§4.4). Generic over a repo implementing both
/// [CollectionRepo] and [FileRegistryRepo] because a single sqlite pool
/// backs both tables and background jobs need both.
#[derive(Clone)]
pub struct IngestService<R> {
    repo: R,
    vector: Arc<dyn VectorDb + Send + Sync>,
    store: Arc<dyn DocumentStore + Send + Sync>,
    plugins: Arc<PluginRegistry>,
    workers: Arc<Semaphore>,
}

impl<R> IngestService<R>
where
    R: CollectionRepo + FileRegistryRepo + Atomic + Clone + Send + Sync + 'static,
{
    pub fn new(
        repo: R,
        vector: Arc<dyn VectorDb + Send + Sync>,
        store: Arc<dyn DocumentStore + Send + Sync>,
        plugins: Arc<PluginRegistry>,
        worker_count: usize,
    ) -> Self {
        Self {
            repo,
            vector,
            store,
            plugins,
            workers: Arc::new(Semaphore::new(worker_count.max(1))),
        }
    }

    /// `IngestFile` (§4.4). Saves the upload, registers the job, and
    /// schedules the background step. Returns as soon as the row is
    /// persisted; `documents_added` is always `0` in the response.
    #[allow(clippy::too_many_arguments)]
    pub async fn submit_file_ingest(
        &self,
        collection_id: Uuid,
        owner: &str,
        original_filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
        plugin_name: &str,
        mut params: Value,
    ) -> Result<IngestResponse, KbError> {
        let collection = CollectionRepo::get_by_id(&self.repo, collection_id)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(collection_id.to_string())))?;

        let plugin = self.plugins.get_ingest(plugin_name)?;
        // A remote-ingest plugin may still declare file types it accepts as
        // an alternate input (e.g. `youtube_transcript_ingest` takes a
        // `.txt` of URLs instead of `video_url`); such a plugin is
        // reachable through this entry point too, matching the original's
        // `youtube_transcript_ingest.py` (`kind = "remote-ingest"`,
        // `supported_file_types = {"txt"}`).
        if plugin.kind() != PluginKind::FileIngest && plugin.supported_file_types().is_empty() {
            return err!(
                BadInput,
                "plugin '{}' does not accept file uploads",
                plugin_name
            );
        }

        let content_hash = sha256(bytes);
        if let Some(existing) = self
            .repo
            .find_by_content_hash(collection_id, &content_hash)
            .await?
        {
            return err!(
                Conflict,
                "identical content already ingested as file registry entry '{}'",
                existing.id
            );
        }

        let (file_path, file_url, hash) = self
            .store
            .write(owner, &collection.name, original_filename, bytes)
            .await?;
        debug_assert_eq!(hash, content_hash);

        if let Value::Object(ref mut map) = params {
            map.insert("file_url".to_string(), json!(file_url));
        }

        let insert = FileRegistryInsert::new(collection_id, owner, original_filename, plugin_name, params.clone())
            .with_file(&file_path, &file_url, bytes.len() as i64, content_type.unwrap_or("application/octet-stream"), &content_hash);

        let entry = FileRegistryRepo::insert(&self.repo, insert).await?;

        self.spawn_job(entry.id, collection.vector_uuid.clone(), collection.embeddings_model.clone(), plugin_name.to_string(), Some(file_path.clone()), params);

        Ok(IngestResponse {
            status: "processing",
            file_registry_id: entry.id,
            file_path: Some(file_path),
            file_url: Some(file_url),
            collection_id,
            collection_name: collection.name,
            plugin_name: plugin_name.to_string(),
            documents_added: 0,
        })
    }

    /// `IngestBase` (§4.4), including URL and YouTube ingestion — both are
    /// remote-ingest plugins invoked through this entry point rather than
    /// `submit_file_ingest` since there is no upload.
    pub async fn submit_base_ingest(
        &self,
        collection_id: Uuid,
        owner: &str,
        plugin_name: &str,
        params: Value,
    ) -> Result<IngestResponse, KbError> {
        let collection = CollectionRepo::get_by_id(&self.repo, collection_id)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(collection_id.to_string())))?;

        let plugin = self.plugins.get_ingest(plugin_name)?;
        if !matches!(plugin.kind(), PluginKind::BaseIngest | PluginKind::RemoteIngest) {
            return err!(
                BadInput,
                "plugin '{}' is not a base- or remote-ingest plugin",
                plugin_name
            );
        }

        let original_filename = derive_original_filename(plugin_name, &params);

        let insert = FileRegistryInsert::new(collection_id, owner, &original_filename, plugin_name, params.clone());
        let entry = FileRegistryRepo::insert(&self.repo, insert).await?;

        self.spawn_job(entry.id, collection.vector_uuid.clone(), collection.embeddings_model.clone(), plugin_name.to_string(), None, params);

        Ok(IngestResponse {
            status: "processing",
            file_registry_id: entry.id,
            file_path: None,
            file_url: None,
            collection_id,
            collection_name: collection.name,
            plugin_name: plugin_name.to_string(),
            documents_added: 0,
        })
    }

    /// `POST /collections/{id}/documents` (§6): a synchronous add that
    /// bypasses the plugin framework and the file registry entirely — the
    /// caller already has `{text, metadata}` pairs in hand.
    pub async fn add_documents(
        &self,
        collection_id: Uuid,
        documents: Vec<IngestChunk>,
    ) -> Result<usize, KbError> {
        let collection = CollectionRepo::get_by_id(&self.repo, collection_id)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(collection_id.to_string())))?;

        if documents.is_empty() {
            return Ok(0);
        }

        let embedder = Embedder::build(&collection.embeddings_model)
            .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;

        let tag = Uuid::new_v4().to_string();
        let chunk_count = documents.len();
        let now = Utc::now().to_rfc3339();

        let mut records = Vec::with_capacity(chunk_count);
        for (i, mut doc) in documents.into_iter().enumerate() {
            let id = Uuid::new_v4().to_string();
            doc.metadata.entry(META_SOURCE).or_insert(json!("api"));
            doc.metadata.entry(META_FILENAME).or_insert(json!("direct"));
            doc.metadata
                .entry(META_CHUNKING_STRATEGY)
                .or_insert(json!("none"));
            doc.metadata.insert(META_CHUNK_INDEX.to_string(), json!(i));
            doc.metadata
                .insert(META_CHUNK_COUNT.to_string(), json!(chunk_count));
            doc.metadata
                .insert(META_INGESTION_TIMESTAMP.to_string(), json!(now));
            doc.metadata
                .insert(META_DOCUMENT_ID.to_string(), json!(id));
            doc.metadata
                .insert(META_EMBEDDING_VENDOR.to_string(), json!(collection.embeddings_model.vendor));
            doc.metadata
                .insert(META_EMBEDDING_MODEL.to_string(), json!(collection.embeddings_model.model));
            doc.metadata
                .insert(FILE_REGISTRY_ID_KEY.to_string(), json!(tag));
            records.push((id, doc.text, doc.metadata));
        }

        add_in_sub_batches(&*self.vector, &embedder, &collection.vector_uuid, &collection.embeddings_model.model, records).await?;

        Ok(chunk_count)
    }

    pub async fn list_files(
        &self,
        collection_id: Uuid,
        status: Option<FileStatus>,
    ) -> Result<Vec<FileRegistryEntry>, KbError> {
        self.repo.list_for_collection(collection_id, status).await
    }

    pub async fn get_file(&self, file_id: Uuid) -> Result<FileRegistryEntry, KbError> {
        FileRegistryRepo::get_by_id(&self.repo, file_id)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(file_id.to_string())))
    }

    pub async fn set_file_status(&self, file_id: Uuid, status: FileStatus) -> Result<FileRegistryEntry, KbError> {
        self.repo.set_status(file_id, status).await?;
        self.get_file(file_id).await
    }

    /// `GET /files/{id}/content` (§6). Reconstructs the file by joining
    /// chunks with newlines in `chunk_index` order, per the Open Question
    /// resolution in DESIGN.md (round-trip fidelity is approximate for
    /// non-text sources).
    pub async fn get_file_content(&self, file_id: Uuid) -> Result<FileContent, KbError> {
        let entry = self.get_file(file_id).await?;
        let collection = CollectionRepo::get_by_id(&self.repo, entry.collection_id)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(entry.collection_id.to_string())))?;

        let mut hits = self
            .vector
            .list_by_file(&collection.vector_uuid, &entry.id.to_string())
            .await?;

        hits.sort_by_key(|h| {
            h.metadata
                .get(META_CHUNK_INDEX)
                .and_then(Value::as_i64)
                .unwrap_or(0)
        });

        let content = hits
            .into_iter()
            .map(|h| h.text)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(FileContent {
            file_id: entry.id,
            original_filename: entry.original_filename,
            content,
            content_type: entry.content_type,
            chunk_count: entry.document_count as usize,
            timestamp: entry.updated_at,
        })
    }

    /// `DeleteCollection.files[i]` / `DELETE /collections/{id}/files/{id}`
    /// (§6). `hard` removes the row outright; otherwise only `status` flips
    /// to `deleted` and the chunks stay registered as gone in the vector
    /// store (best-effort per §4.1).
    pub async fn delete_file(&self, file_id: Uuid, hard: bool) -> Result<DeleteFileResponse, KbError> {
        let entry = self.get_file(file_id).await?;
        let collection = CollectionRepo::get_by_id(&self.repo, entry.collection_id)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(entry.collection_id.to_string())))?;

        let deleted_embeddings = match self
            .vector
            .delete_by_file(&collection.vector_uuid, &file_id.to_string())
            .await
        {
            Ok(n) => n,
            Err(e) => {
                warn!("failed deleting embeddings for file '{file_id}': {e}");
                0
            }
        };

        let mut removed_files = vec![];
        if hard {
            if let Some(path) = &entry.file_path {
                match self.store.delete(path).await {
                    Ok(()) => removed_files.push(path.clone()),
                    Err(e) => warn!("failed deleting upload '{path}': {e}"),
                }
            }
            FileRegistryRepo::remove(&self.repo, file_id).await?;
        } else {
            self.repo.set_status(file_id, FileStatus::Deleted).await?;
        }

        Ok(DeleteFileResponse {
            deleted_embeddings,
            removed_files,
            status: "deleted",
        })
    }

    /// Schedules the background half of §4.4's algorithm (steps f-i) on the
    /// worker pool. Fire-and-forget: the caller has already responded.
    fn spawn_job(
        &self,
        file_registry_id: Uuid,
        vector_uuid: String,
        embeddings_model: kb_embedders::ProviderDescriptor,
        plugin_name: String,
        file_path: Option<String>,
        params: Value,
    ) {
        let repo = self.repo.clone();
        let vector = self.vector.clone();
        let plugins = self.plugins.clone();
        let workers = self.workers.clone();

        tokio::spawn(async move {
            let Ok(_permit) = workers.acquire().await else {
                return;
            };

            let result = run_ingest_job(
                &*vector,
                &plugins,
                file_registry_id,
                &vector_uuid,
                &embeddings_model,
                &plugin_name,
                file_path.as_deref(),
                &params,
            )
            .await;

            match result {
                Ok(document_count) => {
                    if let Err(e) = repo.complete(file_registry_id, document_count as i64).await {
                        error!("failed marking file registry '{file_registry_id}' completed: {e}");
                    }
                    info!(%file_registry_id, document_count, "ingestion completed");
                }
                Err(e) => {
                    e.print();
                    if let Err(e) = repo.fail(file_registry_id).await {
                        error!("failed marking file registry '{file_registry_id}' failed: {e}");
                    }
                }
            }
        });
    }
}

/// One full run of §4.4 steps (f)-(h), shared by file and base ingestion.
#[allow(clippy::too_many_arguments)]
async fn run_ingest_job(
    vector: &(dyn VectorDb + Send + Sync),
    plugins: &PluginRegistry,
    file_registry_id: Uuid,
    vector_uuid: &str,
    embeddings_model: &kb_embedders::ProviderDescriptor,
    plugin_name: &str,
    file_path: Option<&str>,
    params: &Value,
) -> Result<usize, KbError> {
    let plugin = plugins.get_ingest(plugin_name)?;
    let chunks: Vec<IngestChunk> = plugin.ingest(file_path, params).await?;

    if chunks.is_empty() {
        return err!(BadInput, "plugin '{}' produced zero chunks", plugin_name);
    }

    let embedder = Embedder::build(embeddings_model)
        .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;

    let chunk_count = chunks.len();
    let now = Utc::now().to_rfc3339();
    let source = file_path
        .map(String::from)
        .or_else(|| {
            params
                .get("file_url")
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| plugin_name.to_string());
    let file_url = params
        .get("file_url")
        .and_then(Value::as_str)
        .unwrap_or(&source)
        .to_string();
    let filename = file_path
        .and_then(|p| p.rsplit('/').next())
        .unwrap_or(plugin_name)
        .to_string();

    let mut records = Vec::with_capacity(chunk_count);
    for (i, mut chunk) in chunks.into_iter().enumerate() {
        let id = Uuid::new_v4().to_string();
        chunk.metadata.entry(META_SOURCE).or_insert(json!(source));
        chunk
            .metadata
            .entry(META_FILENAME)
            .or_insert(json!(filename));
        chunk
            .metadata
            .entry(META_FILE_URL)
            .or_insert(json!(file_url));
        chunk
            .metadata
            .entry(META_CHUNKING_STRATEGY)
            .or_insert(json!(plugin_name));
        chunk
            .metadata
            .insert(META_CHUNK_INDEX.to_string(), json!(i));
        chunk
            .metadata
            .insert(META_CHUNK_COUNT.to_string(), json!(chunk_count));
        chunk
            .metadata
            .insert(META_INGESTION_TIMESTAMP.to_string(), json!(now));
        chunk
            .metadata
            .insert(META_DOCUMENT_ID.to_string(), json!(id));
        chunk
            .metadata
            .insert(META_EMBEDDING_VENDOR.to_string(), json!(embeddings_model.vendor));
        chunk
            .metadata
            .insert(META_EMBEDDING_MODEL.to_string(), json!(embeddings_model.model));
        chunk
            .metadata
            .insert(FILE_REGISTRY_ID_KEY.to_string(), json!(file_registry_id.to_string()));
        records.push((id, chunk.text, chunk.metadata));
    }

    add_in_sub_batches(vector, &embedder, vector_uuid, &embeddings_model.model, records).await?;

    Ok(chunk_count)
}

/// Embeds and writes `records` in sub-batches of [ADD_BATCH_SIZE], tagging
/// every point's metadata with `file_registry_id` after the caller has
/// inserted its own tag value under that key.
async fn add_in_sub_batches(
    vector: &(dyn VectorDb + Send + Sync),
    embedder: &Embedder,
    vector_uuid: &str,
    model: &str,
    records: Vec<(String, String, serde_json::Map<String, Value>)>,
) -> Result<(), KbError> {
    for batch in records.chunks(ADD_BATCH_SIZE) {
        let texts: Vec<&str> = batch.iter().map(|(_, text, _)| text.as_str()).collect();
        let vectors = embedder
            .embed(&texts, model)
            .await
            .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;

        let vector_records = batch
            .iter()
            .zip(vectors)
            .map(|((id, text, metadata), vector)| VectorRecord {
                id: id.clone(),
                text: text.clone(),
                metadata: metadata.clone(),
                vector,
            })
            .collect();

        vector.add_batch(vector_uuid, vector_records).await?;
    }

    Ok(())
}

/// Derives the file registry's `original_filename` for base/remote ingest
/// jobs that have no upload. `url_ingest` uses the first URL (§8 scenario
/// 2); `youtube_transcript_ingest` uses `video_url`; anything else falls
/// back to the plugin name.
fn derive_original_filename(plugin_name: &str, params: &Value) -> String {
    if let Some(urls) = params.get("urls").and_then(Value::as_array) {
        if let Some(first) = urls.first().and_then(Value::as_str) {
            return first.to_string();
        }
    }
    if let Some(url) = params.get("video_url").and_then(Value::as_str) {
        return url.to_string();
    }
    plugin_name.to_string()
}
