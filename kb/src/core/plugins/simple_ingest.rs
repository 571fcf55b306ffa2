use async_trait::async_trait;
use serde_json::Value;

use crate::core::model::file_registry::IngestChunk;
use crate::core::plugin::{IngestPlugin, PluginKind};
use crate::err;
use crate::error::KbError;

use super::{split, split_params_schema, SplitParams};

/// Plain text chunking by `{chunk_size, chunk_overlap, splitter_type}`
/// (§4.4). The simplest built-in file-ingest plugin: no format conversion,
/// just a UTF-8 read and a split.
pub struct SimpleIngest;

#[async_trait]
impl IngestPlugin for SimpleIngest {
    fn name(&self) -> &'static str {
        "simple_ingest"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::FileIngest
    }

    fn description(&self) -> &'static str {
        "Chunks a plain text file by character count, sentence boundary, or token count."
    }

    fn supported_file_types(&self) -> &'static [&'static str] {
        &["txt", "md", "json", "csv", "xml"]
    }

    fn parameters(&self) -> Value {
        split_params_schema()
    }

    async fn ingest(
        &self,
        file_path: Option<&str>,
        params: &Value,
    ) -> Result<Vec<IngestChunk>, KbError> {
        let Some(file_path) = file_path else {
            return err!(BadInput, "simple_ingest requires an uploaded file");
        };

        let bytes = tokio::fs::read(file_path)
            .await
            .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;
        let text = String::from_utf8_lossy(&bytes).to_string();

        let split_params: SplitParams = serde_json::from_value(params.clone()).unwrap_or_default();
        let chunks = split(&text, &split_params)?;

        Ok(chunks
            .into_iter()
            .map(|text| IngestChunk {
                text,
                metadata: serde_json::Map::new(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chunks_a_plain_text_file() {
        let dir = std::env::temp_dir().join(format!("simple_ingest_test_{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("doc.txt");
        let content = "a".repeat(2400);
        tokio::fs::write(&path, &content).await.unwrap();

        let plugin = SimpleIngest;
        let params = serde_json::json!({ "chunk_size": 1000, "chunk_overlap": 200, "splitter_type": "char" });
        let chunks = plugin
            .ingest(Some(path.to_str().unwrap()), &params)
            .await
            .unwrap();

        assert_eq!(chunks.len(), 3);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_missing_file_path() {
        let plugin = SimpleIngest;
        let err = plugin.ingest(None, &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err.error, crate::error::KbErr::BadInput(_)));
    }
}
