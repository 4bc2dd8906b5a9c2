//! # Pattern Routes
//!
//! Upload/create, fetch, delete and sharing. Reads, deletes and shares are
//! wrapped with the authorize middleware; each carries the backfill
//! resolver so patterns created before the access-control tables keep
//! working without a data migration.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::{ResourceType, Right};
use crate::patterns::{Pattern, PatternError};
use crate::storage::StorageError;

use super::auth::AuthUser;
use super::authorize::{authorize_mw, AuthorizePolicy, OwnerResolver};
use super::error::ApiError;
use super::server::AppState;

#[derive(Debug, Serialize)]
pub struct PatternResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub file_id: String,
    pub file_url: String,
    pub created_at: String,
}

impl PatternResponse {
    fn from_pattern(pattern: &Pattern, file_url: String) -> Self {
        Self {
            id: pattern.id,
            owner_id: pattern.owner_id,
            name: pattern.name.clone(),
            file_id: pattern.file_reference.clone(),
            file_url,
            created_at: pattern.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ShareRequest {
    pub user_id: Uuid,
    pub rights: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub user_id: Uuid,
    pub rights: BTreeSet<Right>,
    pub granted_by: Uuid,
}

/// Owner lookup used by the backfill flow
fn pattern_owner_resolver() -> OwnerResolver {
    Arc::new(|state: AppState, id: Uuid| {
        Box::pin(async move {
            state
                .patterns
                .find_by_id(id)
                .ok()
                .flatten()
                .map(|p| p.owner_id)
        })
    })
}

fn guarded(rights: &'static [Right]) -> AuthorizePolicy {
    AuthorizePolicy::new()
        .rights(rights)
        .resource_param("id")
        .backfill(ResourceType::Pattern, pattern_owner_resolver())
}

pub fn pattern_routes(state: AppState) -> Router {
    let read = (state.clone(), Arc::new(guarded(&[Right::Read])));
    let write = (state.clone(), Arc::new(guarded(&[Right::Write])));
    let remove = (state.clone(), Arc::new(guarded(&[Right::Delete])));

    Router::new()
        .route("/", post(create_pattern_handler))
        .route(
            "/:id",
            get(get_pattern_handler)
                .route_layer(middleware::from_fn_with_state(read, authorize_mw)),
        )
        .route(
            "/:id",
            delete(delete_pattern_handler)
                .route_layer(middleware::from_fn_with_state(remove, authorize_mw)),
        )
        .route(
            "/:id/share",
            post(share_pattern_handler)
                .route_layer(middleware::from_fn_with_state(write.clone(), authorize_mw)),
        )
        .route(
            "/:id/share/:user_id",
            delete(unshare_pattern_handler)
                .route_layer(middleware::from_fn_with_state(write, authorize_mw)),
        )
        .with_state(state)
}

/// Multipart upload: a `name` field plus the pattern file itself.
///
/// Creation is the nominal path that seeds the Resource row, so freshly
/// uploaded patterns never hit the backfill.
async fn create_pattern_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PatternResponse>), ApiError> {
    let mut name: Option<String> = None;
    let mut file: Option<(String, String, Vec<u8>)> = None; // (filename, mime, bytes)

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("name") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.to_string()))?,
                );
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("pattern").to_string();
                let mime = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.to_string()))?;
                file = Some((file_name, mime, data.to_vec()));
            }
            _ => {}
        }
    }

    let (file_name, mime, data) =
        file.ok_or_else(|| ApiError::BadRequest("missing file field".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("empty upload".to_string()));
    }
    let name = name.unwrap_or_else(|| file_name.clone());

    let metadata = state.storage.upload(&data, &file_name, &mime).await?;

    let pattern = Pattern::new(user.id, &name, &metadata.id);
    state.patterns.create(&pattern)?;
    state
        .access
        .ensure_resource(ResourceType::Pattern, pattern.id, user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(PatternResponse::from_pattern(&pattern, metadata.url)),
    ))
}

async fn get_pattern_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PatternResponse>, ApiError> {
    let pattern = state
        .patterns
        .find_by_id(id)?
        .ok_or_else(|| PatternError::NotFound(id.to_string()))?;

    let url = state.storage.url(pattern.storage_id());
    Ok(Json(PatternResponse::from_pattern(&pattern, url)))
}

async fn delete_pattern_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let pattern = state
        .patterns
        .find_by_id(id)?
        .ok_or_else(|| PatternError::NotFound(id.to_string()))?;

    // A missing stored file must not wedge deletion of the row
    match state.storage.delete(pattern.storage_id()).await {
        Ok(()) | Err(StorageError::FileNotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    state.patterns.delete(id)?;
    state.access.delete_resource(id)?;

    Ok(StatusCode::NO_CONTENT)
}

async fn share_pattern_handler(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<ShareRequest>,
) -> Result<(StatusCode, Json<ShareResponse>), ApiError> {
    let mut rights = BTreeSet::new();
    for name in &request.rights {
        let right = Right::parse(name)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown right: {}", name)))?;
        rights.insert(right);
    }

    let grant = state
        .access
        .grant_rights(id, request.user_id, rights, user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(ShareResponse {
            user_id: grant.user_id,
            rights: grant.rights,
            granted_by: grant.granted_by,
        }),
    ))
}

async fn unshare_pattern_handler(
    State(state): State<AppState>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state.access.revoke_rights(id, user_id)?;
    Ok(StatusCode::NO_CONTENT)
}
