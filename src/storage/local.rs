//! # Local Filesystem Backend
//!
//! Stores each upload under its generated id as an extension-less filename
//! inside one configured directory. Lookups resolve the stored filename by
//! prefix-matching the id against a directory listing, which tolerates
//! legacy files stored as `id.ext`. With 128-bit ids a prefix collision is
//! not a practical concern.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::backend::FileStorage;
use super::errors::{StorageError, StorageResult};
use super::metadata::{generate_file_id, FileMetadata};

/// Local filesystem storage backend
#[derive(Debug)]
pub struct LocalBackend {
    dir: PathBuf,
}

impl LocalBackend {
    /// Create the backend; fails fast if the directory cannot be created
    pub fn new(dir: PathBuf) -> StorageResult<Self> {
        if dir.as_os_str().is_empty() {
            return Err(StorageError::Misconfigured(
                "local storage requires a directory".to_string(),
            ));
        }
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(Self { dir })
    }

    /// Resolve the stored filename whose name starts with `file_id`
    async fn resolve(&self, file_id: &str) -> StorageResult<PathBuf> {
        if file_id.is_empty() {
            return Err(StorageError::FileNotFound(file_id.to_string()));
        }

        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?
        {
            if let Some(name) = entry.file_name().to_str() {
                if name.starts_with(file_id) {
                    return Ok(entry.path());
                }
            }
        }

        Err(StorageError::FileNotFound(file_id.to_string()))
    }
}

#[async_trait]
impl FileStorage for LocalBackend {
    async fn upload(
        &self,
        data: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> StorageResult<FileMetadata> {
        let id = generate_file_id();
        let path = self.dir.join(&id);

        fs::write(&path, data)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(FileMetadata {
            url: self.url(&id),
            checksum: FileMetadata::checksum_of(data),
            id,
            original_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size: data.len() as u64,
        })
    }

    async fn download(&self, file_id: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(file_id).await?;
        fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(file_id.to_string())
            } else {
                StorageError::Io(e.to_string())
            }
        })
    }

    async fn delete(&self, file_id: &str) -> StorageResult<()> {
        let path = self.resolve(file_id).await?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::FileNotFound(file_id.to_string())
            } else {
                StorageError::Io(e.to_string())
            }
        })
    }

    fn url(&self, file_id: &str) -> String {
        self.dir.join(file_id).to_string_lossy().into_owned()
    }
}
