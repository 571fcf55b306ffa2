//! Built-in ingestion and query plugins (§4.4, §4.5).
//!
//! Every plugin here is pure with respect to the catalog and vector store:
//! it only turns raw input into `{text, metadata}` chunks (or, for query
//! plugins, resolves parameters). The ingestion pipeline is the only thing
//! that talks to the vector store and the file registry.

pub mod markitdown_ingest;
pub mod mockai_json_ingest;
pub mod simple_ingest;
pub mod simple_query;
pub mod url_ingest;
pub mod youtube_transcript_ingest;

use crate::error::KbError;
use crate::err;
use chunx::{SlidingWindow, SnappingWindow, TokenWindow};
use serde::Deserialize;

/// `splitter_type` values shared by `simple_ingest`, `markitdown_ingest` and
/// `url_ingest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitterType {
    /// Sentence-aware window ([SnappingWindow]) — the default; backs off to
    /// natural text boundaries instead of a hard byte cut.
    Recursive,
    /// Hard byte-count window with no boundary awareness ([SlidingWindow]).
    Char,
    /// Whitespace-token-counting window ([TokenWindow]).
    Token,
}

impl Default for SplitterType {
    fn default() -> Self {
        Self::Recursive
    }
}

/// Common `{chunk_size, chunk_overlap, splitter_type}` knobs (§4.4's
/// `simple_ingest` plugin, reused by `markitdown_ingest` and `url_ingest`).
#[derive(Debug, Clone, Deserialize)]
pub struct SplitParams {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default)]
    pub splitter_type: SplitterType,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

impl Default for SplitParams {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            splitter_type: SplitterType::default(),
        }
    }
}

/// Split `text` according to `params`, returning owned chunk strings in
/// order (order matters for `chunk_index` metadata, §5 ordering guarantee).
pub fn split(text: &str, params: &SplitParams) -> Result<Vec<String>, KbError> {
    let chunks = match params.splitter_type {
        SplitterType::Recursive => {
            let window = SnappingWindow::default_with_size(params.chunk_size, params.chunk_overlap)
                .map_err(|e| KbError::new(file!(), line!(), column!(), crate::error::KbErr::Chunker(e)))?;
            window
                .chunk(text)
                .map_err(|e| KbError::new(file!(), line!(), column!(), crate::error::KbErr::Chunker(e)))?
        }
        SplitterType::Char => {
            let window = SlidingWindow::new(params.chunk_size, params.chunk_overlap)
                .map_err(|e| KbError::new(file!(), line!(), column!(), crate::error::KbErr::Chunker(e)))?;
            window
                .chunk(text)
                .map_err(|e| KbError::new(file!(), line!(), column!(), crate::error::KbErr::Chunker(e)))?
                .into_iter()
                .map(String::from)
                .collect()
        }
        SplitterType::Token => {
            let window = TokenWindow::new(params.chunk_size, params.chunk_overlap)
                .map_err(|e| KbError::new(file!(), line!(), column!(), crate::error::KbErr::Chunker(e)))?;
            window
                .chunk(text)
                .map_err(|e| KbError::new(file!(), line!(), column!(), crate::error::KbErr::Chunker(e)))?
                .into_iter()
                .map(String::from)
                .collect()
        }
    };

    if chunks.is_empty() {
        return err!(BadInput, "splitting produced zero chunks");
    }

    Ok(chunks)
}

/// JSON schema fragment shared by every plugin that accepts [SplitParams].
pub fn split_params_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "chunk_size": { "type": "integer", "default": 1000 },
            "chunk_overlap": { "type": "integer", "default": 200 },
            "splitter_type": {
                "type": "string",
                "enum": ["recursive", "char", "token"],
                "default": "recursive"
            }
        },
        "required": []
    })
}
