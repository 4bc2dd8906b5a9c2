//! # Patterns
//!
//! Minimal pattern domain model and repository. The wider product keeps
//! measurements, fabric requirements, tags and favorites here; this core
//! only needs the fields that authorization and file delivery touch: the
//! owner, the display name, and the stored-file reference.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Result type for pattern repository operations
pub type PatternResult<T> = Result<T, PatternError>;

/// Pattern domain errors
#[derive(Debug, Clone, Error)]
pub enum PatternError {
    #[error("Pattern not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

impl PatternError {
    pub fn status_code(&self) -> u16 {
        match self {
            PatternError::NotFound(_) => 404,
            PatternError::Repository(_) => 500,
        }
    }
}

/// A sewing pattern row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    /// Storage id of the uploaded file, or a legacy path ending in it
    pub file_reference: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    pub fn new(owner_id: Uuid, name: &str, file_reference: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            owner_id,
            name: name.to_string(),
            file_reference: file_reference.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Bare storage id for this pattern's file.
    ///
    /// Legacy rows store a full path; the id is its last segment.
    pub fn storage_id(&self) -> &str {
        self.file_reference
            .rsplit('/')
            .next()
            .unwrap_or(&self.file_reference)
    }

    /// Whether this pattern's file reference matches `identifier`.
    ///
    /// Matches the bare storage id as well as a legacy stored path whose
    /// last segment is the id.
    pub fn references_file(&self, identifier: &str) -> bool {
        if identifier.is_empty() {
            return false;
        }
        self.file_reference == identifier
            || self
                .file_reference
                .rsplit('/')
                .next()
                .is_some_and(|last| last == identifier)
    }
}

/// Repository for pattern rows
pub trait PatternRepository: Send + Sync {
    fn find_by_id(&self, id: Uuid) -> PatternResult<Option<Pattern>>;
    fn find_by_file_identifier(&self, identifier: &str) -> PatternResult<Option<Pattern>>;
    fn create(&self, pattern: &Pattern) -> PatternResult<()>;
    fn delete(&self, id: Uuid) -> PatternResult<()>;
}

/// In-memory pattern repository
#[derive(Debug, Default)]
pub struct InMemoryPatternRepository {
    rows: RwLock<HashMap<Uuid, Pattern>>,
}

impl InMemoryPatternRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatternRepository for InMemoryPatternRepository {
    fn find_by_id(&self, id: Uuid) -> PatternResult<Option<Pattern>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| PatternError::Repository("Lock poisoned".to_string()))?;
        Ok(rows.get(&id).cloned())
    }

    fn find_by_file_identifier(&self, identifier: &str) -> PatternResult<Option<Pattern>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| PatternError::Repository("Lock poisoned".to_string()))?;
        Ok(rows
            .values()
            .find(|p| p.references_file(identifier))
            .cloned())
    }

    fn create(&self, pattern: &Pattern) -> PatternResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| PatternError::Repository("Lock poisoned".to_string()))?;
        rows.insert(pattern.id, pattern.clone());
        Ok(())
    }

    fn delete(&self, id: Uuid) -> PatternResult<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| PatternError::Repository("Lock poisoned".to_string()))?;
        rows.remove(&id)
            .map(|_| ())
            .ok_or_else(|| PatternError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_bare_id_and_legacy_path() {
        let pattern = Pattern::new(Uuid::new_v4(), "Wrap dress", "/var/uploads/abc123");

        assert!(pattern.references_file("abc123"));
        assert!(pattern.references_file("/var/uploads/abc123"));
        assert!(!pattern.references_file("abc"));
        assert!(!pattern.references_file(""));
    }

    #[test]
    fn test_storage_id_strips_legacy_path() {
        let legacy = Pattern::new(Uuid::new_v4(), "Coat", "/old/uploads/abc123");
        assert_eq!(legacy.storage_id(), "abc123");

        let bare = Pattern::new(Uuid::new_v4(), "Coat", "abc123");
        assert_eq!(bare.storage_id(), "abc123");
    }

    #[test]
    fn test_find_by_file_identifier() {
        let repo = InMemoryPatternRepository::new();
        let pattern = Pattern::new(Uuid::new_v4(), "Culottes", "deadbeef");
        repo.create(&pattern).unwrap();

        let found = repo.find_by_file_identifier("deadbeef").unwrap().unwrap();
        assert_eq!(found.id, pattern.id);
        assert!(repo.find_by_file_identifier("other").unwrap().is_none());
    }

    #[test]
    fn test_delete_unknown_is_not_found() {
        let repo = InMemoryPatternRepository::new();
        let result = repo.delete(Uuid::new_v4());
        assert!(matches!(result, Err(PatternError::NotFound(_))));
    }
}
