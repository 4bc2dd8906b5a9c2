//! # File Delivery Service
//!
//! Resolves a pattern's stored file, enforces the read-right check, sniffs
//! the content type from the bytes and hands the handler everything it
//! needs for `Content-Type` and `Content-Disposition`.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::access::{AccessControlService, AccessError, ResourceType, Right};
use crate::patterns::{PatternError, PatternRepository};
use crate::storage::{FileStorage, StorageError};

use super::sniff;

/// File delivery errors
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// No pattern references the requested file
    #[error("File not found: {0}")]
    UnknownFile(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl DeliveryError {
    pub fn status_code(&self) -> u16 {
        match self {
            DeliveryError::UnknownFile(_) => 404,
            DeliveryError::Access(e) => e.status_code(),
            DeliveryError::Storage(e) => e.status_code(),
            DeliveryError::Pattern(e) => e.status_code(),
        }
    }
}

/// A resolved, authorized download
#[derive(Debug, Clone)]
pub struct FileDownload {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    /// ASCII-safe filename for the `Content-Disposition` header
    pub file_name: String,
}

/// Service resolving and authorizing pattern file downloads
#[derive(Clone)]
pub struct FileDeliveryService {
    patterns: Arc<dyn PatternRepository>,
    access: AccessControlService,
    storage: Arc<dyn FileStorage>,
}

impl FileDeliveryService {
    pub fn new(
        patterns: Arc<dyn PatternRepository>,
        access: AccessControlService,
        storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            patterns,
            access,
            storage,
        }
    }

    /// Resolve `identifier` to a pattern file the caller may read.
    ///
    /// The identifier is matched against the storage id or a legacy path
    /// suffix. The pattern's Resource row is ensured (legacy rows predate
    /// the access-control tables) before the read-right assertion, so the
    /// owner is never locked out of their own historical uploads.
    pub async fn open(&self, user_id: Uuid, identifier: &str) -> Result<FileDownload, DeliveryError> {
        let pattern = self
            .patterns
            .find_by_file_identifier(identifier)?
            .ok_or_else(|| DeliveryError::UnknownFile(identifier.to_string()))?;

        self.access
            .ensure_resource(ResourceType::Pattern, pattern.id, pattern.owner_id)?;
        self.access
            .assert_has_rights(user_id, pattern.id, &[Right::Read], true)?;

        let bytes = self.storage.download(pattern.storage_id()).await?;

        let sniffed = sniff::sniff(&bytes);
        let file_name = download_file_name(&pattern.name, sniffed.extension);
        debug!(%user_id, identifier, mime = sniffed.mime, "file delivered");

        Ok(FileDownload {
            bytes,
            mime_type: sniffed.mime,
            file_name,
        })
    }
}

/// Build an ASCII-safe filename from a pattern display name plus the
/// sniffed extension.
///
/// Anything outside `[A-Za-z0-9._-]` becomes an underscore so the value can
/// be quoted into `Content-Disposition` without escaping concerns.
pub fn download_file_name(display_name: &str, extension: &str) -> String {
    let mut stem: String = display_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    stem.truncate(120);
    let stem = stem.trim_matches(|c| c == '_' || c == '.');
    let stem = if stem.is_empty() { "pattern" } else { stem };

    format!("{}.{}", stem, extension)
}
