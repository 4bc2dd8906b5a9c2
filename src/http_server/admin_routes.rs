//! # Admin Routes
//!
//! Role management and instance settings. The whole router sits behind an
//! `admin` role gate; per-resource rights never apply here.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::roles::RoleRef;
use crate::access::Role;

use super::authorize::{authorize_mw, AuthorizePolicy};
use super::error::ApiError;
use super::server::AppState;

#[derive(Debug, Serialize)]
pub struct RolesResponse {
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    /// Role primary key or name
    pub role: String,
}

pub fn admin_routes(state: AppState) -> Router {
    let admin_only = (
        state.clone(),
        Arc::new(AuthorizePolicy::new().roles(&["admin"])),
    );

    Router::new()
        .route("/roles", get(list_roles_handler))
        .route("/users/:id/roles", get(user_roles_handler))
        .route("/users/:id/roles", post(assign_role_handler))
        .route("/users/:id/roles/:role", delete(revoke_role_handler))
        .route("/settings", get(get_settings_handler))
        .route("/settings", put(update_settings_handler))
        .route_layer(middleware::from_fn_with_state(admin_only, authorize_mw))
        .with_state(state)
}

async fn list_roles_handler(
    State(state): State<AppState>,
) -> Result<Json<RolesResponse>, ApiError> {
    Ok(Json(RolesResponse {
        roles: state.roles.list_roles()?,
    }))
}

async fn user_roles_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RolesResponse>, ApiError> {
    Ok(Json(RolesResponse {
        roles: state.roles.user_roles(user_id)?,
    }))
}

/// Accepts the role's primary key or its name
fn parse_role_ref(value: &str) -> RoleRef {
    match Uuid::parse_str(value) {
        Ok(id) => RoleRef::Id(id),
        Err(_) => RoleRef::Name(value.to_string()),
    }
}

async fn assign_role_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(request): Json<AssignRoleRequest>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    let role = state
        .roles
        .assign_role(user_id, parse_role_ref(&request.role))?;
    Ok((StatusCode::CREATED, Json(role)))
}

async fn revoke_role_handler(
    State(state): State<AppState>,
    Path((user_id, role)): Path<(Uuid, String)>,
) -> Result<StatusCode, ApiError> {
    state.roles.revoke_role(user_id, parse_role_ref(&role))?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_settings_handler(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let settings = state
        .settings
        .read()
        .map_err(|_| ApiError::BadRequest("settings lock poisoned".to_string()))?;
    Ok(Json(settings.clone()))
}

async fn update_settings_handler(
    State(state): State<AppState>,
    Json(new_settings): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut settings = state
        .settings
        .write()
        .map_err(|_| ApiError::BadRequest("settings lock poisoned".to_string()))?;
    *settings = new_settings;
    Ok(Json(settings.clone()))
}
