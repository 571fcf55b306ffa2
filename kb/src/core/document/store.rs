use super::parser::Parser;
use crate::error::KbError;

/// Reads and writes uploaded file contents. Decouples the ingestion
/// pipeline from where bytes actually live.
///
/// Uploads are written under `static/<owner>/<collection_name>/<random>.<ext>`
/// (§4.4) and served back out read-only from that same path.
#[async_trait::async_trait]
pub trait DocumentStore {
    fn id(&self) -> &'static str;

    /// Read and parse the file at `path`.
    async fn read(&self, path: &str, parser: &Parser) -> Result<String, KbError>;

    /// Delete the file at `path`.
    async fn delete(&self, path: &str) -> Result<(), KbError>;

    /// Write `content` under `owner/collection_name`, generating a random
    /// file stem and preserving `original_name`'s extension.
    ///
    /// Returns `(path, url, hash)`: the on-disk path, the read-only URL the
    /// file is served from, and the hex-encoded SHA-256 of `content`.
    async fn write(
        &self,
        owner: &str,
        collection_name: &str,
        original_name: &str,
        content: &[u8],
    ) -> Result<(String, String, String), KbError>;
}
