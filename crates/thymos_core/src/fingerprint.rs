//! Content fingerprints for dedup.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the message text, byte for byte.
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
