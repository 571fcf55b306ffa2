use std::sync::Arc;

use kb_embedders::{Embedder, ProviderDescriptor};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::document::store::DocumentStore;
use crate::core::model::collection::{
    Collection, CollectionInsert, CollectionList, CollectionUpdate, CreateVectorCollection,
    DeleteCollectionResponse, Visibility,
};
use crate::core::repo::collection::{CollectionListParams, CollectionRepo};
use crate::core::repo::Atomic;
use crate::core::vector::VectorDb;
use crate::error::KbError;
use crate::err;

/// Metadata Catalog (§4.1). Owns collection identity and keeps the catalog
/// row and the paired vector-store collection in lockstep (invariant I1).
///
/// `vector_uuid` is generated once at creation and used directly as the
/// vector-store collection's own name; it never changes, so ingest/query
/// never have to care about catalog renames. A catalog rename still
/// triggers `VectorStore.Rename(vector_uuid, new_name)` (invariant I3),
/// which aliases the new name to the stable underlying collection.
#[derive(Clone)]
pub struct CatalogService<R> {
    repo: R,
    vector: Arc<dyn VectorDb + Send + Sync>,
    store: Arc<dyn DocumentStore + Send + Sync>,
    embedding_defaults: ProviderDescriptor,
}

impl<R> CatalogService<R>
where
    R: CollectionRepo + Atomic + Clone + Send + Sync,
{
    pub fn new(
        repo: R,
        vector: Arc<dyn VectorDb + Send + Sync>,
        store: Arc<dyn DocumentStore + Send + Sync>,
        embedding_defaults: ProviderDescriptor,
    ) -> Self {
        Self {
            repo,
            vector,
            store,
            embedding_defaults,
        }
    }

    /// `CreateCollection` (§4.1). Resolves `"default"` fields, probes the
    /// embedding provider to discover the vector size, creates the paired
    /// vector-store collection, then persists the row. Rolls the vector
    /// collection back if the row insert fails.
    pub async fn create_collection(
        &self,
        name: &str,
        owner: &str,
        description: Option<&str>,
        visibility: Visibility,
        mut embeddings_model: ProviderDescriptor,
    ) -> Result<Collection, KbError> {
        if self
            .repo
            .get_by_owner_and_name(owner, name)
            .await?
            .is_some()
        {
            return err!(Conflict, "collection '{}' already exists for '{}'", name, owner);
        }

        embeddings_model.substitute_defaults(&self.embedding_defaults);
        if !embeddings_model.is_resolved()
            || embeddings_model.vendor.is_empty()
            || embeddings_model.model.is_empty()
        {
            return err!(
                BadInput,
                "embeddings_model is missing required fields after default substitution"
            );
        }

        let size = Embedder::probe_dimension(&embeddings_model)
            .await
            .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;

        let collection_id = Uuid::new_v4();
        let vector_uuid = Uuid::new_v4().to_string();

        self.vector
            .create_vector_collection(CreateVectorCollection::new(
                collection_id,
                &vector_uuid,
                size,
                &embeddings_model.vendor,
                &embeddings_model.model,
            ))
            .await?;

        let mut insert = CollectionInsert::new(name, owner, visibility, &embeddings_model, &vector_uuid);
        insert.id = collection_id;
        if let Some(description) = description {
            insert = insert.with_description(description);
        }

        match self.repo.insert(insert).await {
            Ok(collection) => Ok(collection),
            Err(e) => {
                warn!("rolling back vector collection '{vector_uuid}' after catalog insert failure");
                let _ = self.vector.delete_vector_collection(&vector_uuid).await;
                Err(e)
            }
        }
    }

    pub async fn get_collection(&self, id: Uuid) -> Result<Collection, KbError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(id.to_string())))
    }

    pub async fn get_collection_by_owner_and_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<Collection>, KbError> {
        self.repo.get_by_owner_and_name(owner, name).await
    }

    pub async fn list_collections(&self, params: CollectionListParams<'_>) -> Result<CollectionList, KbError> {
        self.repo.list(params).await
    }

    /// `UpdateCollection` (§4.1). `vendor`/`model` cannot be set through
    /// [CollectionUpdate] at all (invariant I2) — any attempt to do so never
    /// reaches this far because the DTO has no fields for them; a caller
    /// that tries anyway via a raw JSON body with extra keys has those keys
    /// ignored by serde, which is the "silently ignored and logged" policy
    /// in effect, logged here.
    ///
    /// A `name` change triggers `VectorStore.Rename(old, new)` first
    /// (invariant I3): the vector-store collection itself stays addressed
    /// by `vector_uuid` forever, so "rename" means aliasing the new catalog
    /// name to that underlying collection. If the rename fails, the catalog
    /// row is left untouched and the error propagates to the caller.
    pub async fn update_collection(
        &self,
        id: Uuid,
        update: CollectionUpdate,
    ) -> Result<Collection, KbError> {
        if let Some(new_name) = update.name.as_deref() {
            let collection = self.get_collection(id).await?;
            if new_name != collection.name {
                info!(collection_id = %id, old_name = %collection.name, %new_name, "renaming collection");
                self.vector
                    .rename_vector_collection(&collection.vector_uuid, new_name)
                    .await?;
            }
        }
        self.repo
            .update(id, update)
            .await?
            .ok_or_else(|| KbError::new(file!(), line!(), column!(), crate::error::KbErr::NotFound(id.to_string())))
    }

    /// `DeleteCollection` (§4.1) → `{removed_embeddings, removed_files[]}`.
    /// Best-effort per resource (§7 "partial failures"): a missing vector
    /// collection or a missing upload on disk does not abort removal of the
    /// catalog row. Cascades to every `FileRegistry` row for `id` (I4) and
    /// deletes each row's uploaded file from the upload tree, closing the
    /// round-trip law in §8 ("create(c); delete(c) leaves the catalog, the
    /// vector store, and the upload tree with no trace of c").
    pub async fn delete_collection(&self, id: Uuid) -> Result<DeleteCollectionResponse, KbError>
    where
        R: crate::core::repo::file_registry::FileRegistryRepo,
    {
        let collection = self.get_collection(id).await?;

        let removed_embeddings = match self.vector.count(&collection.vector_uuid).await {
            Ok(n) => n,
            Err(e) => {
                warn!("vector collection '{}' missing or failed to count: {e}", collection.vector_uuid);
                0
            }
        };

        if let Err(e) = self.vector.delete_vector_collection(&collection.vector_uuid).await {
            warn!("vector collection '{}' missing or failed to delete: {e}", collection.vector_uuid);
        }

        let files =
            crate::core::repo::file_registry::FileRegistryRepo::list_for_collection(&self.repo, id, None).await?;

        let mut removed_files = Vec::new();
        for file in &files {
            if let Some(path) = &file.file_path {
                match self.store.delete(path).await {
                    Ok(()) => removed_files.push(path.clone()),
                    Err(e) => warn!("failed deleting upload '{path}' for collection '{id}': {e}"),
                }
            }
        }

        crate::core::repo::file_registry::FileRegistryRepo::remove_for_collection(&self.repo, id).await?;
        CollectionRepo::remove(&self.repo, id).await?;

        Ok(DeleteCollectionResponse {
            removed_embeddings,
            removed_files,
        })
    }
}
