//! # Database Blob Backend
//!
//! Stores the byte payload as a column on a dedicated table row keyed by
//! the generated id. Useful for small self-hosted setups where running a
//! separate object store is not worth it.

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use super::backend::FileStorage;
use super::errors::{StorageError, StorageResult};
use super::metadata::{generate_file_id, FileMetadata};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS stored_files (
    id TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    name TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    created_at TEXT NOT NULL
)";

/// Database-blob storage backend
#[derive(Debug)]
pub struct DatabaseBackend {
    pool: SqlitePool,
}

impl DatabaseBackend {
    /// Connect and ensure the blob table exists
    pub async fn connect(url: &str) -> StorageResult<Self> {
        if url.is_empty() {
            return Err(StorageError::Misconfigured(
                "database storage requires a connection url".to_string(),
            ));
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Self::with_pool(pool).await
    }

    /// Build over an existing pool (tests, shared app pool)
    pub async fn with_pool(pool: SqlitePool) -> StorageResult<Self> {
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl FileStorage for DatabaseBackend {
    async fn upload(
        &self,
        data: &[u8],
        file_name: &str,
        mime_type: &str,
    ) -> StorageResult<FileMetadata> {
        let id = generate_file_id();

        sqlx::query(
            "INSERT INTO stored_files (id, data, name, mime_type, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(data)
        .bind(file_name)
        .bind(mime_type)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Database(e.to_string()))?;

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
        let row = sqlx::query("SELECT data FROM stored_files WHERE id = ?")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?
            .ok_or_else(|| StorageError::FileNotFound(file_id.to_string()))?;

        Ok(row.get::<Vec<u8>, _>("data"))
    }

    async fn delete(&self, file_id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM stored_files WHERE id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(StorageError::FileNotFound(file_id.to_string()));
        }
        Ok(())
    }

    fn url(&self, file_id: &str) -> String {
        format!("db://stored_files/{}", file_id)
    }
}
