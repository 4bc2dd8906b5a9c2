//! # Object Store Backend
//!
//! Keys objects under a fixed prefix plus the generated id and delegates
//! put/get/delete to an S3-compatible HTTP endpoint (path-style addressing,
//! e.g. MinIO or a signing gateway in front of S3 proper).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use super::backend::FileStorage;
use super::errors::{StorageError, StorageResult};
use super::metadata::{generate_file_id, FileMetadata};

/// Fixed key prefix for pattern uploads
const KEY_PREFIX: &str = "patterns/";

/// Object-storage backend over HTTP
#[derive(Debug)]
pub struct ObjectBackend {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl ObjectBackend {
    /// Create the backend; selecting `object` storage without a bucket or
    /// endpoint is a configuration error surfaced at construction
    pub fn new(endpoint: &str, bucket: &str) -> StorageResult<Self> {
        if endpoint.is_empty() {
            return Err(StorageError::Misconfigured(
                "object storage requires an endpoint".to_string(),
            ));
        }
        if bucket.is_empty() {
            return Err(StorageError::Misconfigured(
                "object storage requires a bucket name".to_string(),
            ));
        }

        Ok(Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
        })
    }

    fn object_url(&self, file_id: &str) -> String {
        format!("{}/{}/{}{}", self.endpoint, self.bucket, KEY_PREFIX, file_id)
    }
}

#[async_trait]
impl FileStorage for ObjectBackend {
    async fn upload(
        &self,
        data: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> StorageResult<FileMetadata> {
        let id = generate_file_id();

        let response = self
            .client
            .put(self.object_url(&id))
            .header("content-type", mime_type)
            .body(data.to_vec())
            .send()
            .await
            .map_err(|e| StorageError::ObjectStore(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::ObjectStore(format!(
                "put {} returned {}",
                id,
                response.status()
            )));
        }

        Ok(FileMetadata {
            url: self.object_url(&id),
            checksum: FileMetadata::checksum_of(data),
            id,
            original_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            size: data.len() as u64,
        })
    }

    async fn download(&self, file_id: &str) -> StorageResult<Vec<u8>> {
        let response = self
            .client
            .get(self.object_url(file_id))
            .send()
            .await
            .map_err(|e| StorageError::ObjectStore(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::FileNotFound(file_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(StorageError::ObjectStore(format!(
                "get {} returned {}",
                file_id,
                response.status()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| StorageError::ObjectStore(e.to_string()))?;

        if body.is_empty() {
            return Err(StorageError::EmptyObject(file_id.to_string()));
        }

        Ok(body.to_vec())
    }

    async fn delete(&self, file_id: &str) -> StorageResult<()> {
        let response = self
            .client
            .delete(self.object_url(file_id))
            .send()
            .await
            .map_err(|e| StorageError::ObjectStore(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StorageError::FileNotFound(file_id.to_string()));
        }
        if !response.status().is_success() {
            return Err(StorageError::ObjectStore(format!(
                "delete {} returned {}",
                file_id,
                response.status()
            )));
        }

        Ok(())
    }

    fn url(&self, file_id: &str) -> String {
        self.object_url(file_id)
    }
}
