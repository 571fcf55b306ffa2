use crate::core::model::collection::{Collection, CollectionInsert, CollectionList, CollectionUpdate};
use crate::error::KbError;
use uuid::Uuid;

use super::Atomic;

/// Parameters for [CollectionRepo::list]. Offset-based; ordering is
/// unspecified.
#[derive(Debug, Default, Clone)]
pub struct CollectionListParams<'a> {
    pub owner: Option<&'a str>,
    pub visibility: Option<crate::core::model::collection::Visibility>,
    pub skip: i64,
    pub limit: i64,
}

/// Tracks collections and the vector-store collection each one is paired
/// with (invariant I1).
#[async_trait::async_trait]
pub trait CollectionRepo {
    /// Get a collection by ID.
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Collection>, KbError>;

    /// Get a collection by its `(owner, name)` pair; names are unique
    /// per-owner.
    async fn get_by_owner_and_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<Collection>, KbError>;

    /// List collections matching the given filters.
    async fn list(&self, params: CollectionListParams<'_>) -> Result<CollectionList, KbError>;

    /// Insert a new collection row.
    async fn insert(&self, insert: CollectionInsert<'_>) -> Result<Collection, KbError>;

    /// Apply a partial update. `vendor`/`model` are never touched here
    /// (invariant I2) — [CollectionUpdate] has no fields for them.
    async fn update(
        &self,
        id: Uuid,
        update: CollectionUpdate,
    ) -> Result<Option<Collection>, KbError>;

    /// Remove a collection row. Does not touch the paired vector-store
    /// collection; callers are responsible for deleting that first so the
    /// removal is atomic from the caller's perspective (invariant I1).
    async fn remove(&self, id: Uuid) -> Result<u64, KbError>;

    /// Insert a collection row and run `$op` in the same transaction, for
    /// callers that need to persist the paired vector-store collection id
    /// before committing.
    async fn insert_tx(
        &self,
        insert: CollectionInsert<'_>,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<Collection, KbError>
    where
        Self: Atomic;
}
