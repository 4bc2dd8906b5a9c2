//! # Storage Errors

use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// File storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No stored file matches the id
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Backend selected without its required settings; raised at
    /// construction, never mid-request
    #[error("Storage misconfigured: {0}")]
    Misconfigured(String),

    /// Object store returned an empty body
    #[error("Object is empty: {0}")]
    EmptyObject(String),

    /// Remote object store failure
    #[error("Object store error: {0}")]
    ObjectStore(String),

    /// Database backend failure
    #[error("Database error: {0}")]
    Database(String),

    /// Local filesystem failure
    #[error("I/O error: {0}")]
    Io(String),
}

impl StorageError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            StorageError::FileNotFound(_) => 404,
            StorageError::EmptyObject(_) => 404,
            StorageError::Misconfigured(_) => 500,
            StorageError::ObjectStore(_) => 502,
            StorageError::Database(_) => 500,
            StorageError::Io(_) => 500,
        }
    }
}
