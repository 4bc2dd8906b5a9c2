//! # File Metadata
//!
//! Record produced by every backend `upload`, consumed by the domain layer
//! to populate a pattern's file reference. Not persisted beyond the
//! backend's own bookkeeping.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Metadata describing one stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Storage key, generated by the backend at upload time
    pub id: String,
    /// Caller-supplied filename; metadata only, never used as a storage key
    pub original_name: String,
    /// Content type as declared at upload (delivery re-sniffs from bytes)
    pub mime_type: String,
    pub size: u64,
    pub url: String,
    /// SHA-256 of the stored bytes, hex-encoded
    pub checksum: String,
}

impl FileMetadata {
    pub fn checksum_of(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }
}

/// Generate a storage id.
///
/// Backends never derive keys from caller filenames; a fresh 128-bit id
/// sidesteps path traversal and collisions uniformly. The simple (dash-free)
/// form keeps ids safe as bare filenames and object keys.
pub fn generate_file_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_sha256_hex() {
        let checksum = FileMetadata::checksum_of(b"bodice-block.pdf contents");
        assert_eq!(checksum.len(), 64);
        assert!(checksum.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_generated_ids_are_unique_and_plain() {
        let a = generate_file_id();
        let b = generate_file_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
