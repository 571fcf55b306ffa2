use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::core::document::parser::Parser;
use crate::core::model::document::DocumentType;
use crate::core::model::file_registry::IngestChunk;
use crate::core::plugin::{IngestPlugin, PluginKind};
use crate::err;
use crate::error::KbError;

use super::{split, split_params_schema, SplitParams};

/// Converts PDFs, Office documents and HTML to Markdown, then applies the
/// same `{chunk_size, chunk_overlap, splitter_type}` chunking knobs as
/// [super::simple_ingest::SimpleIngest] (§4.4). Also writes an HTML
/// rendering of the converted Markdown next to the source file as a
/// preview sidecar.
pub struct MarkitdownIngest;

#[async_trait]
impl IngestPlugin for MarkitdownIngest {
    fn name(&self) -> &'static str {
        "markitdown_ingest"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::FileIngest
    }

    fn description(&self) -> &'static str {
        "Converts PDF, DOCX and HTML documents to Markdown and chunks the result."
    }

    fn supported_file_types(&self) -> &'static [&'static str] {
        &["pdf", "docx", "html", "htm"]
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
            return err!(BadInput, "markitdown_ingest requires an uploaded file");
        };

        let file_name = file_path
            .rsplit('/')
            .next()
            .unwrap_or(file_path)
            .to_string();
        let doc_type = DocumentType::try_from_file_name(&file_name)?;

        let bytes = tokio::fs::read(file_path)
            .await
            .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;

        let markdown = Parser::new(doc_type).parse(&bytes)?;

        if let Err(e) = write_html_preview(file_path, &markdown).await {
            warn!("failed writing html preview for '{file_path}': {e}");
        }

        let split_params: SplitParams = serde_json::from_value(params.clone()).unwrap_or_default();
        let chunks = split(&markdown, &split_params)?;

        Ok(chunks
            .into_iter()
            .map(|text| IngestChunk {
                text,
                metadata: serde_json::Map::new(),
            })
            .collect())
    }
}

/// Renders `markdown` to a minimal standalone HTML document and writes it
/// to `{file_path}.html`, next to the source upload.
async fn write_html_preview(file_path: &str, markdown: &str) -> Result<(), KbError> {
    let parser = pulldown_cmark::Parser::new(markdown);
    let mut body = String::new();
    pulldown_cmark::html::push_html(&mut body, parser);

    let html = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"></head><body>{body}</body></html>"
    );

    tokio::fs::write(format!("{file_path}.html"), html)
        .await
        .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn converts_html_to_chunks() {
        let dir = std::env::temp_dir().join(format!("markitdown_test_{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("doc.html");
        tokio::fs::write(&path, "<h1>Title</h1><p>Body text.</p>")
            .await
            .unwrap();

        let plugin = MarkitdownIngest;
        let params = serde_json::json!({ "chunk_size": 1000, "chunk_overlap": 0 });
        let chunks = plugin
            .ingest(Some(path.to_str().unwrap()), &params)
            .await
            .unwrap();

        assert!(!chunks.is_empty());
        assert!(chunks[0].text.contains("Title"));
        assert!(tokio::fs::try_exists(format!("{}.html", path.display()))
            .await
            .unwrap());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
