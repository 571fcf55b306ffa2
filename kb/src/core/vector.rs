use super::model::collection::{CreateVectorCollection, VectorCollection};
use crate::error::KbError;
use serde_json::{Map, Value};

/// One chunk queued for storage: the id the caller assigns (equals the
/// chunk's own `document_id` metadata value, §3), its text, its metadata
/// map, and the embedding computed for it by the caller's [kb_embedders::Embedder].
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    pub vector: Vec<f32>,
}

/// One hit returned from [VectorDb::query].
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    /// Cosine distance in `[0,2]` (§4.2); the query service converts this
    /// to `similarity = 1 - distance`.
    pub distance: f32,
}

/// Operations against the pluggable vector-store adapter (qdrant).
///
/// Every knowledge-base collection has exactly one paired vector-store
/// collection (invariant I1); this trait is the seam that lets the catalog
/// stay agnostic of which backend holds the vectors.
///
/// Embeddings are computed by the
/// caller (ingestion pipeline / query service) via [kb_embedders::Embedder]
/// and handed to this trait as plain vectors, rather than this trait
/// calling an injected `embedding_fn` itself — see DESIGN.md for the
/// rationale. Invariant V1 (dimensional compatibility) is preserved because
/// every caller rebuilds the same [kb_embedders::Embedder] from the
/// collection's immutable `embeddings_model` (vendor/model are never
/// updated, invariant I2).
#[async_trait::async_trait]
pub trait VectorDb {
    /// Identifies the provider, e.g. `"qdrant"`.
    fn id(&self) -> &'static str;

    /// List the vector-store's collections.
    async fn list_vector_collections(&self) -> Result<Vec<VectorCollection>, KbError>;

    /// Create a new vector-store collection for a knowledge-base collection.
    async fn create_vector_collection(
        &self,
        data: CreateVectorCollection<'_>,
    ) -> Result<(), KbError>;

    /// Get collection info.
    async fn get_collection(&self, name: &str) -> Result<VectorCollection, KbError>;

    /// Delete a vector-store collection. Idempotent: a missing collection
    /// is not an error (§4.1 `DeleteCollection` is best-effort).
    async fn delete_vector_collection(&self, name: &str) -> Result<(), KbError>;

    /// Rename a vector-store collection (invariant I3).
    async fn rename_vector_collection(&self, old: &str, new: &str) -> Result<(), KbError>;

    /// Called once on startup to ensure the default collection exists.
    /// It's fine to panic here; this only runs before the server accepts
    /// traffic.
    async fn create_default_collection(&self, data: CreateVectorCollection<'_>);

    /// Semantic search. `vector` is the already-embedded query vector.
    /// Results are ordered by ascending distance (descending similarity);
    /// ties are broken by the adapter using insertion/id order.
    async fn query(
        &self,
        collection: &str,
        vector: Vec<f32>,
        top_k: u32,
    ) -> Result<Vec<VectorHit>, KbError>;

    /// Insert `records` into `collection`. Each record's `id` becomes the
    /// point id; `metadata` is stored as the payload.
    async fn add_batch(&self, collection: &str, records: Vec<VectorRecord>) -> Result<(), KbError>;

    /// Delete every point tagged with `metadata.file_registry_id ==
    /// file_registry_id` (the adapter-level equivalent of a generic
    /// `DeleteWhere`, specialized to the one predicate the pipeline and
    /// file-registry lifecycle ever need). Returns the number removed.
    async fn delete_by_file(
        &self,
        collection: &str,
        file_registry_id: &str,
    ) -> Result<usize, KbError>;

    /// Delete individual points by id.
    async fn delete(&self, collection: &str, ids: &[String]) -> Result<(), KbError>;

    /// Count the points tagged with `metadata.file_registry_id == file_registry_id`.
    async fn count_by_file(&self, collection: &str, file_registry_id: &str)
        -> Result<usize, KbError>;

    /// Fetch every point tagged with `metadata.file_registry_id ==
    /// file_registry_id`, used to reconstruct `GET /files/{id}/content`
    /// (§6). `distance` on the returned hits is meaningless here and
    /// should be ignored by callers.
    async fn list_by_file(
        &self,
        collection: &str,
        file_registry_id: &str,
    ) -> Result<Vec<VectorHit>, KbError>;

    /// Count every point in `collection`.
    async fn count(&self, collection: &str) -> Result<usize, KbError>;
}

/// Metadata key every adapter uses to tag a point with the
/// [crate::core::model::file_registry::FileRegistryEntry] it was produced
/// by, so [VectorDb::delete_by_file] / [VectorDb::count_by_file] can find it
/// again. Distinct from the `document_id` metadata key required at ingest,
/// which is the chunk's own id.
pub const FILE_REGISTRY_ID_KEY: &str = "file_registry_id";

/// Required chunk metadata keys (§3).
pub const META_SOURCE: &str = "source";
pub const META_FILENAME: &str = "filename";
pub const META_FILE_URL: &str = "file_url";
pub const META_CHUNKING_STRATEGY: &str = "chunking_strategy";
pub const META_CHUNK_INDEX: &str = "chunk_index";
pub const META_CHUNK_COUNT: &str = "chunk_count";
pub const META_INGESTION_TIMESTAMP: &str = "ingestion_timestamp";
pub const META_DOCUMENT_ID: &str = "document_id";
pub const META_EMBEDDING_VENDOR: &str = "embedding_vendor";
pub const META_EMBEDDING_MODEL: &str = "embedding_model";
