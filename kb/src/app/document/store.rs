//! Filesystem-backed [DocumentStore]: uploads land under
//! `<base>/<owner>/<collection_name>/<random>.<ext>` (§4.4) and are served
//! back out read-only from that same path by the static file layer
//! (out of scope for this crate, per §1).

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use uuid::Uuid;

use crate::core::document::parser::Parser;
use crate::core::document::{sha256, store::DocumentStore};
use crate::error::KbError;
use crate::map_err;

#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    base: PathBuf,
}

impl FsDocumentStore {
    pub fn new(base: &str) -> Self {
        let base = PathBuf::from(base);
        info!("Initialising fs document store at {}", base.display());
        Self { base }
    }

    /// The URL the written file is served back out at, relative to the
    /// static file root (`static/<owner>/<collection_name>/<random>.<ext>`).
    fn public_url(&self, rel: &Path) -> String {
        format!("/{}", rel.display())
    }
}

#[async_trait::async_trait]
impl DocumentStore for FsDocumentStore {
    fn id(&self) -> &'static str {
        "fs"
    }

    async fn read(&self, path: &str, parser: &Parser) -> Result<String, KbError> {
        debug!("Reading {path}");
        let bytes = map_err!(tokio::fs::read(path).await);
        parser.parse(&bytes)
    }

    async fn delete(&self, path: &str) -> Result<(), KbError> {
        debug!("Removing {path}");
        map_err!(tokio::fs::remove_file(path).await);
        Ok(())
    }

    async fn write(
        &self,
        owner: &str,
        collection_name: &str,
        original_name: &str,
        content: &[u8],
    ) -> Result<(String, String, String), KbError> {
        let dir = self.base.join(owner).join(collection_name);
        map_err!(tokio::fs::create_dir_all(&dir).await);

        let ext = Path::new(original_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let stem = Uuid::new_v4().to_string();
        let file_name = format!("{stem}.{ext}");

        let rel = PathBuf::from(owner).join(collection_name).join(&file_name);
        let full_path = self.base.join(&rel);

        map_err!(tokio::fs::write(&full_path, content).await);

        let hash = sha256(content);
        let url = self.public_url(&rel);

        debug!("Wrote upload to {}", full_path.display());

        Ok((full_path.display().to_string(), url, hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_under_owner_and_collection() {
        let base = std::env::temp_dir().join(format!("fs_store_test_{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&base).await.unwrap();

        let store = FsDocumentStore::new(base.to_str().unwrap());
        let (path, url, hash) = store
            .write("alice", "t1", "notes.txt", b"hello world")
            .await
            .unwrap();

        assert!(path.contains("alice"));
        assert!(path.contains("t1"));
        assert!(path.ends_with(".txt"));
        assert!(url.starts_with('/'));
        assert_eq!(hash, sha256(b"hello world"));

        let content = tokio::fs::read(&path).await.unwrap();
        assert_eq!(content, b"hello world");

        tokio::fs::remove_dir_all(&base).await.unwrap();
    }
}
