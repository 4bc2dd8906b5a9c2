//! # Storage Factory
//!
//! Reads configuration once at startup and instantiates exactly one
//! backend. Misconfiguration (unknown kind, object storage without a
//! bucket) fails here, before the server accepts traffic.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::backend::FileStorage;
use super::database::DatabaseBackend;
use super::errors::{StorageError, StorageResult};
use super::local::LocalBackend;
use super::object::ObjectBackend;

/// Which backend to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    Object,
    Database,
}

impl StorageKind {
    pub fn parse(s: &str) -> StorageResult<Self> {
        match s {
            "local" => Ok(StorageKind::Local),
            "object" | "s3" => Ok(StorageKind::Object),
            "database" => Ok(StorageKind::Database),
            other => Err(StorageError::Misconfigured(format!(
                "unknown storage kind: {}",
                other
            ))),
        }
    }
}

/// Storage configuration, read once at process start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub kind: StorageKind,
    /// Upload directory for the local backend
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Endpoint for the object backend
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Bucket for the object backend
    #[serde(default)]
    pub bucket: Option<String>,
    /// Connection url for the database backend
    #[serde(default)]
    pub database_url: Option<String>,
}

impl StorageConfig {
    pub fn local(directory: PathBuf) -> Self {
        Self {
            kind: StorageKind::Local,
            directory: Some(directory),
            endpoint: None,
            bucket: None,
            database_url: None,
        }
    }
}

/// Build the configured backend
pub async fn build_storage(config: &StorageConfig) -> StorageResult<Arc<dyn FileStorage>> {
    let backend: Arc<dyn FileStorage> = match config.kind {
        StorageKind::Local => {
            let dir = config.directory.clone().ok_or_else(|| {
                StorageError::Misconfigured("local storage requires a directory".to_string())
            })?;
            Arc::new(LocalBackend::new(dir)?)
        }
        StorageKind::Object => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                StorageError::Misconfigured("object storage requires an endpoint".to_string())
            })?;
            let bucket = config.bucket.as_deref().ok_or_else(|| {
                StorageError::Misconfigured("object storage requires a bucket name".to_string())
            })?;
            Arc::new(ObjectBackend::new(endpoint, bucket)?)
        }
        StorageKind::Database => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                StorageError::Misconfigured("database storage requires a connection url".to_string())
            })?;
            Arc::new(DatabaseBackend::connect(url).await?)
        }
    };

    info!(kind = ?config.kind, "storage backend ready");
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_kind() {
        assert_eq!(StorageKind::parse("local").unwrap(), StorageKind::Local);
        assert_eq!(StorageKind::parse("s3").unwrap(), StorageKind::Object);
        assert_eq!(
            StorageKind::parse("database").unwrap(),
            StorageKind::Database
        );
        assert!(StorageKind::parse("ftp").is_err());
    }

    #[tokio::test]
    async fn test_local_backend_built() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig::local(temp.path().to_path_buf());
        build_storage(&config).await.unwrap();
    }

    #[tokio::test]
    async fn test_object_without_bucket_fails_fast() {
        let config = StorageConfig {
            kind: StorageKind::Object,
            directory: None,
            endpoint: Some("http://localhost:9000".to_string()),
            bucket: None,
            database_url: None,
        };
        let result = build_storage(&config).await;
        assert!(matches!(result, Err(StorageError::Misconfigured(_))));
    }

    #[tokio::test]
    async fn test_database_without_url_fails_fast() {
        let config = StorageConfig {
            kind: StorageKind::Database,
            directory: None,
            endpoint: None,
            bucket: None,
            database_url: None,
        };
        let result = build_storage(&config).await;
        assert!(matches!(result, Err(StorageError::Misconfigured(_))));
    }
}
