//! SQLite-backed [CollectionRepo] and [FileRegistryRepo]. The relational
//! half of the dual-store design (§2 "Metadata Catalog"); the paired
//! vector-store collection lives in `app::vector`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kb_embedders::ProviderDescriptor;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::types::Json;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::core::model::collection::{
    Collection, CollectionInsert, CollectionList, CollectionUpdate, Visibility,
};
use crate::core::model::file_registry::{FileRegistryEntry, FileRegistryInsert, FileStatus};
use crate::core::repo::collection::{CollectionListParams, CollectionRepo};
use crate::core::repo::file_registry::FileRegistryRepo;
use crate::core::repo::Atomic;
use crate::error::KbError;
use crate::{err, map_err};

/// Connects to `url` and runs the embedded migrations. `url` is a SQLite
/// connection string, e.g. `sqlite://kb.db`.
pub async fn init(url: &str) -> SqlitePool {
    info!("Connecting to sqlite at {url}");

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .expect("error connecting to sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("error running migrations");

    pool
}

#[derive(Debug, Clone)]
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Row shape as it comes back from sqlite; `embeddings_model` is stored as
/// JSON text (see [crate::core::model::collection::Collection]'s doc
/// comment) so it has to be decoded through [Json] before converting.
#[derive(sqlx::FromRow)]
struct CollectionRow {
    id: Uuid,
    name: String,
    owner: String,
    description: Option<String>,
    visibility: Visibility,
    embeddings_model: Json<ProviderDescriptor>,
    vector_uuid: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Collection {
            id: row.id,
            name: row.name,
            owner: row.owner,
            description: row.description,
            visibility: row.visibility,
            embeddings_model: row.embeddings_model.0,
            vector_uuid: row.vector_uuid,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct FileRegistryRow {
    id: Uuid,
    collection_id: Uuid,
    owner: String,
    original_filename: String,
    file_path: Option<String>,
    file_url: Option<String>,
    file_size: Option<i64>,
    content_type: Option<String>,
    content_hash: Option<String>,
    plugin_name: String,
    plugin_params: Json<serde_json::Value>,
    status: FileStatus,
    document_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FileRegistryRow> for FileRegistryEntry {
    fn from(row: FileRegistryRow) -> Self {
        FileRegistryEntry {
            id: row.id,
            collection_id: row.collection_id,
            owner: row.owner,
            original_filename: row.original_filename,
            file_path: row.file_path,
            file_url: row.file_url,
            file_size: row.file_size,
            content_type: row.content_type,
            content_hash: row.content_hash,
            plugin_name: row.plugin_name,
            plugin_params: row.plugin_params.0,
            status: row.status,
            document_count: row.document_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Atomic for SqliteRepo {
    type Tx = Transaction<'static, Sqlite>;

    async fn start_tx(&self) -> Result<Self::Tx, KbError> {
        Ok(map_err!(self.pool.begin().await))
    }

    async fn commit_tx(&self, tx: Self::Tx) -> Result<(), KbError> {
        map_err!(tx.commit().await);
        Ok(())
    }

    async fn abort_tx(&self, tx: Self::Tx) -> Result<(), KbError> {
        map_err!(tx.rollback().await);
        Ok(())
    }
}

#[async_trait]
impl CollectionRepo for SqliteRepo {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Collection>, KbError> {
        let row = map_err!(
            sqlx::query_as::<_, CollectionRow>("SELECT * FROM collections WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
        );
        Ok(row.map(Collection::from))
    }

    async fn get_by_owner_and_name(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<Collection>, KbError> {
        let row = map_err!(
            sqlx::query_as::<_, CollectionRow>(
                "SELECT * FROM collections WHERE owner = ? AND name = ?"
            )
            .bind(owner)
            .bind(name)
            .fetch_optional(&self.pool)
            .await
        );
        Ok(row.map(Collection::from))
    }

    async fn list(&self, params: CollectionListParams<'_>) -> Result<CollectionList, KbError> {
        let CollectionListParams {
            owner,
            visibility,
            skip,
            limit,
        } = params;

        let rows = map_err!(
            sqlx::query_as::<_, CollectionRow>(
                "SELECT * FROM collections \
                 WHERE (?1 IS NULL OR owner = ?1) \
                 AND (?2 IS NULL OR visibility = ?2) \
                 LIMIT ?3 OFFSET ?4"
            )
            .bind(owner)
            .bind(visibility)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await
        );

        let total: i64 = map_err!(
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM collections WHERE (?1 IS NULL OR owner = ?1) AND (?2 IS NULL OR visibility = ?2)"
            )
            .bind(owner)
            .bind(visibility)
            .fetch_one(&self.pool)
            .await
        );

        Ok(CollectionList {
            total,
            items: rows.into_iter().map(Collection::from).collect(),
        })
    }

    async fn insert(&self, insert: CollectionInsert<'_>) -> Result<Collection, KbError> {
        let mut tx = self.start_tx().await?;
        let result = CollectionRepo::insert_tx(self, insert, &mut tx).await;
        match result {
            Ok(collection) => {
                self.commit_tx(tx).await?;
                Ok(collection)
            }
            Err(e) => {
                self.abort_tx(tx).await?;
                Err(e)
            }
        }
    }

    async fn insert_tx(
        &self,
        insert: CollectionInsert<'_>,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<Collection, KbError> {
        let embeddings_model = Json(insert.embeddings_model.clone());

        let exists: Option<(Uuid,)> = map_err!(
            sqlx::query_as("SELECT id FROM collections WHERE owner = ? AND name = ?")
                .bind(insert.owner)
                .bind(insert.name)
                .fetch_optional(&mut **tx)
                .await
        );
        if exists.is_some() {
            return err!(
                Conflict,
                "collection '{}' already exists for '{}'",
                insert.name,
                insert.owner
            );
        }

        let row = map_err!(
            sqlx::query_as::<_, CollectionRow>(
                "INSERT INTO collections (id, name, owner, description, visibility, embeddings_model, vector_uuid) \
                 VALUES (?, ?, ?, ?, ?, ?, ?) RETURNING *"
            )
            .bind(insert.id)
            .bind(insert.name)
            .bind(insert.owner)
            .bind(insert.description)
            .bind(insert.visibility)
            .bind(embeddings_model)
            .bind(insert.vector_uuid)
            .fetch_one(&mut **tx)
            .await
        );

        Ok(Collection::from(row))
    }

    /// `vendor`/`model` are never touched: [CollectionUpdate] has no fields
    /// for them (invariant I2), so there is nothing here to silently ignore
    /// beyond what the DTO already excludes at the type level.
    async fn update(
        &self,
        id: Uuid,
        update: CollectionUpdate,
    ) -> Result<Option<Collection>, KbError> {
        let CollectionUpdate {
            name,
            description,
            visibility,
            endpoint,
            api_key,
        } = update;

        let current = match CollectionRepo::get_by_id(self, id).await? {
            Some(c) => c,
            None => return Ok(None),
        };

        let name = name.unwrap_or(current.name);
        let description = description.or(current.description);
        let visibility = visibility.unwrap_or(current.visibility);

        let mut embeddings_model = current.embeddings_model;
        if let Some(endpoint) = endpoint {
            embeddings_model.endpoint = Some(endpoint);
        }
        if let Some(api_key) = api_key {
            embeddings_model.api_key = Some(api_key);
        }

        let row = map_err!(
            sqlx::query_as::<_, CollectionRow>(
                "UPDATE collections SET name = ?, description = ?, visibility = ?, embeddings_model = ?, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') \
                 WHERE id = ? RETURNING *"
            )
            .bind(&name)
            .bind(&description)
            .bind(visibility)
            .bind(Json(embeddings_model))
            .bind(id)
            .fetch_one(&self.pool)
            .await
        );

        Ok(Some(Collection::from(row)))
    }

    async fn remove(&self, id: Uuid) -> Result<u64, KbError> {
        let result = map_err!(
            sqlx::query("DELETE FROM collections WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
        );
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl FileRegistryRepo for SqliteRepo {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRegistryEntry>, KbError> {
        let row = map_err!(
            sqlx::query_as::<_, FileRegistryRow>("SELECT * FROM file_registry WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
        );
        Ok(row.map(FileRegistryEntry::from))
    }

    async fn find_by_content_hash(
        &self,
        collection_id: Uuid,
        content_hash: &str,
    ) -> Result<Option<FileRegistryEntry>, KbError> {
        let row = map_err!(
            sqlx::query_as::<_, FileRegistryRow>(
                "SELECT * FROM file_registry \
                 WHERE collection_id = ? AND content_hash = ? AND status != 'deleted'"
            )
            .bind(collection_id)
            .bind(content_hash)
            .fetch_optional(&self.pool)
            .await
        );
        Ok(row.map(FileRegistryEntry::from))
    }

    async fn list_for_collection(
        &self,
        collection_id: Uuid,
        status: Option<FileStatus>,
    ) -> Result<Vec<FileRegistryEntry>, KbError> {
        let rows = map_err!(
            sqlx::query_as::<_, FileRegistryRow>(
                "SELECT * FROM file_registry WHERE collection_id = ? AND (?2 IS NULL OR status = ?2) \
                 ORDER BY created_at DESC"
            )
            .bind(collection_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await
        );
        Ok(rows.into_iter().map(FileRegistryEntry::from).collect())
    }

    async fn insert(&self, insert: FileRegistryInsert<'_>) -> Result<FileRegistryEntry, KbError> {
        let mut tx = self.start_tx().await?;
        let result = FileRegistryRepo::insert_tx(self, insert, &mut tx).await;
        match result {
            Ok(entry) => {
                self.commit_tx(tx).await?;
                Ok(entry)
            }
            Err(e) => {
                self.abort_tx(tx).await?;
                Err(e)
            }
        }
    }

    async fn insert_tx(
        &self,
        insert: FileRegistryInsert<'_>,
        tx: &mut <Self as Atomic>::Tx,
    ) -> Result<FileRegistryEntry, KbError> {
        let row = map_err!(
            sqlx::query_as::<_, FileRegistryRow>(
                "INSERT INTO file_registry \
                 (id, collection_id, owner, original_filename, file_path, file_url, file_size, \
                  content_type, content_hash, plugin_name, plugin_params, status) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'processing') RETURNING *"
            )
            .bind(insert.id)
            .bind(insert.collection_id)
            .bind(insert.owner)
            .bind(insert.original_filename)
            .bind(insert.file_path)
            .bind(insert.file_url)
            .bind(insert.file_size)
            .bind(insert.content_type)
            .bind(insert.content_hash)
            .bind(insert.plugin_name)
            .bind(Json(insert.plugin_params))
            .fetch_one(&mut **tx)
            .await
        );
        Ok(FileRegistryEntry::from(row))
    }

    async fn set_status(&self, id: Uuid, status: FileStatus) -> Result<(), KbError> {
        map_err!(
            sqlx::query(
                "UPDATE file_registry SET status = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?"
            )
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await
        );
        Ok(())
    }

    async fn complete(&self, id: Uuid, document_count: i64) -> Result<(), KbError> {
        map_err!(
            sqlx::query(
                "UPDATE file_registry SET status = 'completed', document_count = ?, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now') WHERE id = ?"
            )
            .bind(document_count)
            .bind(id)
            .execute(&self.pool)
            .await
        );
        Ok(())
    }

    async fn fail(&self, id: Uuid) -> Result<(), KbError> {
        self.set_status(id, FileStatus::Failed).await
    }

    async fn remove(&self, id: Uuid) -> Result<u64, KbError> {
        let result = map_err!(
            sqlx::query("DELETE FROM file_registry WHERE id = ?")
                .bind(id)
                .execute(&self.pool)
                .await
        );
        Ok(result.rows_affected())
    }

    async fn remove_for_collection(&self, collection_id: Uuid) -> Result<u64, KbError> {
        let result = map_err!(
            sqlx::query("DELETE FROM file_registry WHERE collection_id = ?")
                .bind(collection_id)
                .execute(&self.pool)
                .await
        );
        Ok(result.rows_affected())
    }
}
