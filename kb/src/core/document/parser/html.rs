use super::ParseConfig;
use crate::error::KbError;
use crate::map_err;
use serde::{Deserialize, Serialize};

/// Converts HTML to Markdown with [htmd]. Used by `markitdown_ingest` and
/// `url_ingest` (§4.4); `config` is accepted for symmetry with the other
/// parsers but HTML has no notion of "elements" to skip, so it is unused.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HtmlParser {
    #[allow(dead_code)]
    config: ParseConfig,
}

impl HtmlParser {
    pub fn new(config: ParseConfig) -> Self {
        Self { config }
    }
}

impl HtmlParser {
    pub fn parse(&self, input: &[u8]) -> Result<String, KbError> {
        let html = String::from_utf8_lossy(input);
        Ok(map_err!(htmd::convert(&html)))
    }
}
