//! # File Delivery Routes
//!
//! `GET /api/v1/files/:identifier` plus its `HEAD` variant. Authorization
//! and existence checks live in the delivery service; HEAD runs the exact
//! same checks and sends no body.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::{Extension, Router};

use super::auth::AuthUser;
use super::error::ApiError;
use super::server::AppState;

pub fn file_routes(state: AppState) -> Router {
    // axum serves HEAD through the get() registration; the handler checks
    // the method itself so no body bytes are ever produced for HEAD
    Router::new()
        .route("/:identifier", get(download_handler))
        .with_state(state)
}

async fn download_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(identifier): Path<String>,
    method: Method,
) -> Result<Response, ApiError> {
    let download = state.delivery.open(user.id, &identifier).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(download.mime_type),
    );
    headers.insert(
        header::CONTENT_LENGTH,
        HeaderValue::from_str(&download.bytes.len().to_string())
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("inline; filename=\"{}\"", download.file_name))
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    );
    headers.insert(
        "cross-origin-resource-policy",
        HeaderValue::from_static("cross-origin"),
    );

    let body = if method == Method::HEAD {
        Body::empty()
    } else {
        Body::from(download.bytes)
    };

    let mut response = Response::builder().status(StatusCode::OK);
    if let Some(response_headers) = response.headers_mut() {
        *response_headers = headers;
    }
    response
        .body(body)
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}
