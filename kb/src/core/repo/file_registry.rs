use crate::core::model::file_registry::{FileRegistryEntry, FileRegistryInsert, FileStatus};
use crate::error::KbError;
use uuid::Uuid;

use super::Atomic;

/// Tracks ingestion jobs and, once `completed`, the chunk count each one
/// produced. The durable handoff between a submit call and its background
/// worker (§9 "async tasks as fire-and-forget post-response work").
#[async_trait::async_trait]
pub trait FileRegistryRepo {
    /// Get an entry by ID.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRegistryEntry>, KbError>;

    /// Find a non-deleted entry in `collection_id` with the given content
    /// hash, used for the content-hash dedup check at ingest.
    async fn find_by_content_hash(
        &self,
        collection_id: Uuid,
        content_hash: &str,
    ) -> Result<Option<FileRegistryEntry>, KbError>;

    /// List entries for a collection, optionally filtered by status.
    async fn list_for_collection(
        &self,
        collection_id: Uuid,
        status: Option<FileStatus>,
    ) -> Result<Vec<FileRegistryEntry>, KbError>;

    /// Insert a new entry with `status = processing` (§4.4 step d).
    async fn insert(&self, insert: FileRegistryInsert<'_>) -> Result<FileRegistryEntry, KbError>;

    /// Transition `status`. `status` is the only field this writes to
    /// (besides `updated_at`); transitions are the sole writer of status.
    async fn set_status(&self, id: Uuid, status: FileStatus) -> Result<(), KbError>;

    /// Mark an entry `completed` and record the chunk count it produced
    /// (§4.4 step i).
    async fn complete(&self, id: Uuid, document_count: i64) -> Result<(), KbError>;

    /// Mark an entry `failed`.
    async fn fail(&self, id: Uuid) -> Result<(), KbError>;

    /// Remove the catalog row outright (used by hard deletes).
    async fn remove(&self, id: Uuid) -> Result<u64, KbError>;

    /// Remove every row for `collection_id` (cascade on collection delete,
    /// invariant I4).
    async fn remove_for_collection(&self, collection_id: Uuid) -> Result<u64, KbError>;

    /// Run `$op` inside a transaction, for callers that need the insert
    /// and an immediately-following read to be atomic.
    async fn insert_tx(
        &self,
        insert: FileRegistryInsert<'_>,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<FileRegistryEntry, KbError>
    where
        Self: Atomic;
}
