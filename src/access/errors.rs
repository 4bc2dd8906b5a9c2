//! # Access Control Errors
//!
//! Error types for resource rights and role checks.

use thiserror::Error;
use uuid::Uuid;

/// Result type for access control operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Access control and role errors
#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// No Resource row exists for the referenced entity.
    ///
    /// The authorize middleware treats this (and only this) variant as a
    /// trigger for the backfill retry.
    #[error("Resource not found: {0}")]
    ResourceNotFound(Uuid),

    /// Caller is not authenticated
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Caller lacks a required role or right
    #[error("Forbidden")]
    Forbidden,

    /// Rights set must be non-empty
    #[error("Rights set must not be empty")]
    EmptyRights,

    /// Referenced role does not exist
    #[error("Role not found: {0}")]
    RoleNotFound(String),

    /// Repository backend failure
    #[error("Repository error: {0}")]
    Repository(String),
}

impl AccessError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            AccessError::ResourceNotFound(_) => 404,
            AccessError::RoleNotFound(_) => 404,
            // Missing authentication at the policy gate is reported as
            // Forbidden, matching the middleware contract.
            AccessError::AuthenticationRequired => 403,
            AccessError::Forbidden => 403,
            AccessError::EmptyRights => 400,
            AccessError::Repository(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AccessError::ResourceNotFound(Uuid::nil()).status_code(), 404);
        assert_eq!(AccessError::Forbidden.status_code(), 403);
        assert_eq!(AccessError::AuthenticationRequired.status_code(), 403);
        assert_eq!(AccessError::Repository("x".into()).status_code(), 500);
    }
}
