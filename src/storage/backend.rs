//! # Storage Backend Trait

use async_trait::async_trait;

use super::errors::StorageResult;
use super::metadata::FileMetadata;

/// Pluggable byte store behind the pattern library.
///
/// Exactly one implementation is selected at startup by the factory; all
/// call sites hold an `Arc<dyn FileStorage>`.
#[async_trait]
pub trait FileStorage: Send + Sync + std::fmt::Debug {
    /// Store `data` under a backend-generated id.
    ///
    /// `file_name` and `mime_type` are recorded as metadata only.
    async fn upload(
        &self,
        data: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> StorageResult<FileMetadata>;

    /// Fetch the raw bytes for a stored id
    async fn download(&self, file_id: &str) -> StorageResult<Vec<u8>>;

    /// Remove the stored file
    async fn delete(&self, file_id: &str) -> StorageResult<()>;

    /// Location string recorded on the domain row
    fn url(&self, file_id: &str) -> String;
}
