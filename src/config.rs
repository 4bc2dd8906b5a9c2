//! # Process Configuration
//!
//! Read once at startup from environment variables. Storage selection and
//! its backend-specific settings feed the storage factory, which validates
//! them before the server accepts traffic.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::http_server::HttpServerConfig;
use crate::storage::{StorageConfig, StorageError, StorageKind, StorageResult};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub http: HttpServerConfig,
    pub storage: StorageConfig,
    /// Secret shared with the identity provider for bearer verification
    pub jwt_secret: String,
}

impl AppConfig {
    /// Load configuration from `STITCHBASE_*` environment variables
    pub fn from_env() -> StorageResult<Self> {
        let kind = match std::env::var("STITCHBASE_STORAGE") {
            Ok(value) => StorageKind::parse(&value)?,
            Err(_) => StorageKind::Local,
        };

        let storage = StorageConfig {
            kind,
            directory: std::env::var("STITCHBASE_UPLOAD_DIR")
                .ok()
                .map(PathBuf::from)
                .or_else(|| Some(default_upload_dir())),
            endpoint: std::env::var("STITCHBASE_OBJECT_ENDPOINT").ok(),
            bucket: std::env::var("STITCHBASE_OBJECT_BUCKET").ok(),
            database_url: std::env::var("STITCHBASE_DATABASE_URL").ok(),
        };

        let jwt_secret = std::env::var("STITCHBASE_JWT_SECRET")
            .map_err(|_| StorageError::Misconfigured("STITCHBASE_JWT_SECRET is required".into()))?;

        let mut http = HttpServerConfig::default();
        if let Ok(port) = std::env::var("STITCHBASE_PORT") {
            http.port = port
                .parse()
                .map_err(|_| StorageError::Misconfigured("invalid STITCHBASE_PORT".into()))?;
        }
        if let Ok(origins) = std::env::var("STITCHBASE_CORS_ORIGINS") {
            http.cors_origins = origins.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(Self {
            http,
            storage,
            jwt_secret,
        })
    }
}

fn default_upload_dir() -> PathBuf {
    std::env::temp_dir().join("stitchbase_uploads")
}
