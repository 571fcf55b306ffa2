use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The durable record of one ingestion job (`file-ingest` or `base-ingest`)
/// and, once `completed`, the chunks it produced in the vector store.
///
/// Not itself a `FromRow` type: `plugin_params` is stored as JSON text, so
/// the sqlite repo decodes into a row type carrying `sqlx::types::Json` and
/// converts.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct FileRegistryEntry {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub owner: String,
    pub original_filename: String,
    pub file_path: Option<String>,
    pub file_url: Option<String>,
    pub file_size: Option<i64>,
    pub content_type: Option<String>,
    pub content_hash: Option<String>,
    pub plugin_name: String,
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub plugin_params: Value,
    pub status: FileStatus,
    pub document_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// FileRegistry.status — a closed set, so a plain text-mapped enum is used
/// rather than a JSON column.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Processing,
    Completed,
    Failed,
    Deleted,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Processing => write!(f, "processing"),
            FileStatus::Completed => write!(f, "completed"),
            FileStatus::Failed => write!(f, "failed"),
            FileStatus::Deleted => write!(f, "deleted"),
        }
    }
}

impl std::str::FromStr for FileStatus {
    type Err = crate::error::KbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "deleted" => Ok(Self::Deleted),
            other => crate::err!(BadInput, "unknown file status '{}'", other),
        }
    }
}

/// DTO for inserting a new job row at submit time (§4.4 step d).
pub struct FileRegistryInsert<'a> {
    pub id: Uuid,
    pub collection_id: Uuid,
    pub owner: &'a str,
    pub original_filename: &'a str,
    pub file_path: Option<&'a str>,
    pub file_url: Option<&'a str>,
    pub file_size: Option<i64>,
    pub content_type: Option<&'a str>,
    pub content_hash: Option<&'a str>,
    pub plugin_name: &'a str,
    pub plugin_params: Value,
}

impl<'a> FileRegistryInsert<'a> {
    pub fn new(
        collection_id: Uuid,
        owner: &'a str,
        original_filename: &'a str,
        plugin_name: &'a str,
        plugin_params: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            collection_id,
            owner,
            original_filename,
            file_path: None,
            file_url: None,
            file_size: None,
            content_type: None,
            content_hash: None,
            plugin_name,
            plugin_params,
        }
    }

    pub fn with_file(
        mut self,
        file_path: &'a str,
        file_url: &'a str,
        file_size: i64,
        content_type: &'a str,
        content_hash: &'a str,
    ) -> Self {
        self.file_path = Some(file_path);
        self.file_url = Some(file_url);
        self.file_size = Some(file_size);
        self.content_type = Some(content_type);
        self.content_hash = Some(content_hash);
        self
    }
}

/// Produced chunk before it's written to the vector store; plugins return
/// these from `Ingest`.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestChunk {
    pub text: String,
    #[cfg_attr(feature = "http", schema(value_type = Object))]
    pub metadata: serde_json::Map<String, Value>,
}

/// Response shape for the ingestion submit endpoints (§6).
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub file_registry_id: Uuid,
    pub file_path: Option<String>,
    pub file_url: Option<String>,
    pub collection_id: Uuid,
    pub collection_name: String,
    pub plugin_name: String,
    pub documents_added: i64,
}

/// Response shape for `DELETE /collections/{id}/files/{file_id}`.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct DeleteFileResponse {
    pub deleted_embeddings: usize,
    pub removed_files: Vec<String>,
    pub status: &'static str,
}

/// Response shape for `GET /files/{file_id}/content`.
#[cfg_attr(feature = "http", derive(utoipa::ToSchema))]
#[derive(Debug, Serialize)]
pub struct FileContent {
    pub file_id: Uuid,
    pub original_filename: String,
    pub content: String,
    pub content_type: Option<String>,
    pub chunk_count: usize,
    pub timestamp: DateTime<Utc>,
}
