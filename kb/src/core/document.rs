use sha2::{Digest, Sha256};

pub mod parser;
pub mod store;

/// Hex-encoded SHA-256 of `content`, used for the FileRegistry content-hash
/// dedup check (invariant I6).
pub fn sha256(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    hex::encode(hasher.finalize())
}
