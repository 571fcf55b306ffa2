use async_trait::async_trait;
use serde_json::Value;
use std::io::Read as _;
use tracing::warn;

use crate::core::model::file_registry::IngestChunk;
use crate::core::plugin::{IngestPlugin, PluginKind};
use crate::err;
use crate::error::KbError;
use crate::map_err;

/// Reads a JSON array (or single object) where each element has `text` and
/// arbitrary metadata; each element yields exactly one chunk, with no
/// resplitting (§4.4). ZIP archives are unpacked in-memory and every
/// contained `.json` member is processed the same way.
pub struct MockaiJsonIngest;

#[async_trait]
impl IngestPlugin for MockaiJsonIngest {
    fn name(&self) -> &'static str {
        "mockai_json_ingest"
    }

    fn kind(&self) -> PluginKind {
        PluginKind::FileIngest
    }

    fn description(&self) -> &'static str {
        "Reads a JSON array of {text, metadata} objects (or a zip of such files) as pre-chunked documents."
    }

    fn supported_file_types(&self) -> &'static [&'static str] {
        &["json", "zip"]
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {}, "required": [] })
    }

    async fn ingest(
        &self,
        file_path: Option<&str>,
        _params: &Value,
    ) -> Result<Vec<IngestChunk>, KbError> {
        let Some(file_path) = file_path else {
            return err!(BadInput, "mockai_json_ingest requires an uploaded file");
        };

        let bytes = tokio::fs::read(file_path)
            .await
            .map_err(|e| KbError::new(file!(), line!(), column!(), e.into()))?;

        let chunks = if file_path.ends_with(".zip") {
            parse_zip(&bytes)?
        } else {
            parse_json_document(&bytes)?
        };

        if chunks.is_empty() {
            return err!(BadInput, "mockai_json_ingest produced zero chunks");
        }

        Ok(chunks)
    }
}

fn parse_zip(bytes: &[u8]) -> Result<Vec<IngestChunk>, KbError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = map_err!(zip::ZipArchive::new(cursor));

    let mut chunks = vec![];
    for i in 0..archive.len() {
        let mut entry = map_err!(archive.by_index(i));
        if !entry.name().ends_with(".json") {
            continue;
        }

        let mut buf = vec![];
        if let Err(e) = entry.read_to_end(&mut buf) {
            warn!("failed reading zip entry '{}': {e}", entry.name());
            continue;
        }

        match parse_json_document(&buf) {
            Ok(mut parsed) => chunks.append(&mut parsed),
            Err(e) => warn!("failed parsing zip entry '{}': {e}", entry.name()),
        }
    }

    Ok(chunks)
}

fn parse_json_document(bytes: &[u8]) -> Result<Vec<IngestChunk>, KbError> {
    let value: Value = map_err!(serde_json::from_slice(bytes));

    let elements = match value {
        Value::Array(elements) => elements,
        obj @ Value::Object(_) => vec![obj],
        _ => return err!(BadInput, "expected a JSON array or object"),
    };

    elements
        .into_iter()
        .map(|el| {
            let Value::Object(mut obj) = el else {
                return err!(BadInput, "every element must be a JSON object");
            };

            let Some(Value::String(text)) = obj.remove("text") else {
                return err!(BadInput, "every element must have a string 'text' field");
            };

            Ok(IngestChunk { text, metadata: obj })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_of_objects() {
        let json = br#"[{"text":"a","tag":"x"},{"text":"b","tag":"y"}]"#;
        let chunks = parse_json_document(json).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "a");
        assert_eq!(chunks[0].metadata.get("tag").unwrap(), "x");
    }

    #[test]
    fn parses_single_object() {
        let json = br#"{"text":"a"}"#;
        let chunks = parse_json_document(json).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn rejects_missing_text_field() {
        let json = br#"[{"tag":"x"}]"#;
        let err = parse_json_document(json).unwrap_err();
        assert!(matches!(err.error, crate::error::KbErr::BadInput(_)));
    }
}
