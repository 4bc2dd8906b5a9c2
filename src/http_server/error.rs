//! # API Error Mapping
//!
//! Central handler: every domain error carries its own HTTP status via
//! `status_code()`, and `ApiError` turns it into a JSON error body. Route
//! handlers only ever propagate with `?`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::access::AccessError;
use crate::delivery::DeliveryError;
use crate::patterns::PatternError;
use crate::storage::StorageError;

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Errors surfaced by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bearer token missing, malformed or expired
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Access(#[from] AccessError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthenticated => 401,
            ApiError::BadRequest(_) => 400,
            ApiError::Access(e) => e.status_code(),
            ApiError::Storage(e) => e.status_code(),
            ApiError::Delivery(e) => e.status_code(),
            ApiError::Pattern(e) => e.status_code(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        if code >= 500 {
            warn!(error = %self, code, "request failed");
        }

        let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_domain_statuses_pass_through() {
        assert_eq!(ApiError::Unauthenticated.status_code(), 401);
        assert_eq!(
            ApiError::from(AccessError::Forbidden).status_code(),
            403
        );
        assert_eq!(
            ApiError::from(AccessError::ResourceNotFound(Uuid::nil())).status_code(),
            404
        );
        assert_eq!(
            ApiError::from(StorageError::FileNotFound("x".into())).status_code(),
            404
        );
    }
}
