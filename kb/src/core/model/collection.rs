use chrono::{DateTime, Utc};
use kb_embedders::ProviderDescriptor;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, per-owner unit pairing relational metadata with an independent
/// vector-index namespace. `name` is unique within `owner`.
///
/// Not itself a `FromRow` type: the `embeddings_model` column is stored as
/// JSON text, so repos decode into a row type carrying `sqlx::types::Json`
/// and convert (see `app::repo::sqlite`).
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct Collection {
    pub id: Uuid,
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub visibility: Visibility,

    /// `vendor`/`model` are immutable after creation (invariant I2);
    /// `endpoint`/`api_key` may be updated.
    ///
    /// `kb_embedders` carries no `utoipa` dependency, so the OpenAPI schema
    /// falls back to a plain object here rather than deriving through it.
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub embeddings_model: ProviderDescriptor,

    /// Opaque id of the paired vector-store collection (invariant I1).
    pub vector_uuid: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Private => write!(f, "private"),
            Visibility::Public => write!(f, "public"),
        }
    }
}

/// DTO for inserting a new collection row.
#[derive(Debug)]
pub struct CollectionInsert<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub owner: &'a str,
    pub description: Option<&'a str>,
    pub visibility: Visibility,
    pub embeddings_model: &'a ProviderDescriptor,
    pub vector_uuid: &'a str,
}

impl<'a> CollectionInsert<'a> {
    pub fn new(
        name: &'a str,
        owner: &'a str,
        visibility: Visibility,
        embeddings_model: &'a ProviderDescriptor,
        vector_uuid: &'a str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            owner,
            description: None,
            visibility,
            embeddings_model,
            vector_uuid,
        }
    }

    pub fn with_description(mut self, description: &'a str) -> Self {
        self.description = Some(description);
        self
    }
}

/// Mutable fields of [Collection]; `vendor`/`model` cannot be changed here
/// (invariant I2) — any such attempt is silently ignored by the service
/// layer and logged.
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub visibility: Option<Visibility>,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
pub struct CollectionList {
    pub total: i64,
    pub items: Vec<Collection>,
}

/// Response shape for `DeleteCollection` (§4.1) / `DELETE /collections/{id}`
/// (§6 lists the per-file shape; this is its collection-wide analogue).
/// Best-effort per resource: a missing vector collection or upload does not
/// fail the call, it is simply absent from `removed_files`.
#[derive(Debug, Default, Serialize)]
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
pub struct DeleteCollectionResponse {
    pub removed_embeddings: usize,
    pub removed_files: Vec<String>,
}

/// The vector-store side of a collection: just identity and dimension, as
/// tracked by the adapter itself (the catalog owns everything else).
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Default, Serialize)]
pub struct VectorCollection {
    pub name: String,
    pub size: usize,
}

impl VectorCollection {
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Parameters for creating the paired vector-store collection; carried
/// alongside [CollectionInsert] so adapters that track provider metadata
/// on their own side (e.g. Weaviate class properties) have it available.
#[derive(Debug, Clone)]
pub struct CreateVectorCollection<'a> {
    pub collection_id: Uuid,
    pub name: &'a str,
    pub size: usize,
    pub embedding_provider: &'a str,
    pub embedding_model: &'a str,
}

impl<'a> CreateVectorCollection<'a> {
    pub fn new(
        collection_id: Uuid,
        name: &'a str,
        size: usize,
        embedding_provider: &'a str,
        embedding_model: &'a str,
    ) -> Self {
        Self {
            collection_id,
            name,
            size,
            embedding_provider,
            embedding_model,
        }
    }
}
