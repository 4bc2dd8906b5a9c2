//! # Authorization Middleware
//!
//! Per-route policy gate composing role checks, resource-right checks and
//! the owner-resolution backfill. Each protected route is wrapped with
//! `middleware::from_fn_with_state` carrying its own `AuthorizePolicy`.
//!
//! The backfill exists because historical domain rows predate the
//! access-control tables: the first check against such a row fails with
//! `ResourceNotFound`, the policy's owner resolver finds the domain owner,
//! the Resource row (plus owner grant) is materialized, and the check runs
//! exactly once more. No loop, no second repair attempt.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::{RawPathParams, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::Extension;
use tracing::debug;
use uuid::Uuid;

use crate::access::service::CreateResourceParams;
use crate::access::{AccessError, ResourceType, Right};

use super::auth::AuthUser;
use super::error::ApiError;
use super::server::AppState;

/// Explicit resource-id getter; takes precedence over the named parameter
pub type ResourceIdGetter = Arc<dyn Fn(&RawPathParams) -> Option<Uuid> + Send + Sync>;

/// Async lookup of the domain owner, used only for backfill
pub type OwnerResolver = Arc<
    dyn Fn(AppState, Uuid) -> Pin<Box<dyn Future<Output = Option<Uuid>> + Send>> + Send + Sync,
>;

/// Configuration for one protected route
#[derive(Clone, Default)]
pub struct AuthorizePolicy {
    roles: Vec<&'static str>,
    rights: Vec<Right>,
    resource_param: Option<&'static str>,
    resource_getter: Option<ResourceIdGetter>,
    deny_owner: bool,
    resource_type: Option<ResourceType>,
    owner_resolver: Option<OwnerResolver>,
}

impl AuthorizePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require at least one of these roles (OR semantics)
    pub fn roles(mut self, roles: &[&'static str]) -> Self {
        self.roles = roles.to_vec();
        self
    }

    /// Require these rights on the resolved resource
    pub fn rights(mut self, rights: &[Right]) -> Self {
        self.rights = rights.to_vec();
        self
    }

    /// Resolve the resource id from this path parameter
    pub fn resource_param(mut self, param: &'static str) -> Self {
        self.resource_param = Some(param);
        self
    }

    /// Resolve the resource id with an explicit getter (wins over the param)
    pub fn resource_getter(mut self, getter: ResourceIdGetter) -> Self {
        self.resource_getter = Some(getter);
        self
    }

    /// Disable the owner bypass (owners then need explicit grants too)
    pub fn deny_owner(mut self) -> Self {
        self.deny_owner = true;
        self
    }

    /// Enable self-healing for legacy rows of the given type
    pub fn backfill(mut self, resource_type: ResourceType, resolver: OwnerResolver) -> Self {
        self.resource_type = Some(resource_type);
        self.owner_resolver = Some(resolver);
        self
    }

    fn resolve_resource_id(&self, params: &RawPathParams) -> Option<Uuid> {
        if let Some(getter) = &self.resource_getter {
            return getter(params);
        }
        let param = self.resource_param?;
        params
            .iter()
            .find(|(name, _)| *name == param)
            .and_then(|(_, value)| Uuid::parse_str(value).ok())
    }
}

/// Evaluate `policy` for `user` against the request's path parameters
pub async fn enforce(
    policy: &AuthorizePolicy,
    state: &AppState,
    user: Option<&AuthUser>,
    params: &RawPathParams,
) -> Result<(), ApiError> {
    // 1. An authenticated caller is always required
    let user = user.ok_or(AccessError::AuthenticationRequired)?;

    // 2. Role gate
    if !policy.roles.is_empty() && !state.roles.user_has_role(user.id, &policy.roles)? {
        debug!(user_id = %user.id, required = ?policy.roles, "role check failed");
        return Err(AccessError::Forbidden.into());
    }

    // 3. Resource-rights gate
    if !policy.rights.is_empty() {
        let resource_id = policy
            .resolve_resource_id(params)
            .ok_or(AccessError::Forbidden)?;
        let allow_owner = !policy.deny_owner;

        match state
            .access
            .assert_has_rights(user.id, resource_id, &policy.rights, allow_owner)
        {
            Ok(()) => {}
            // Only a missing Resource row triggers the repair path, and
            // only when the policy is configured for it
            Err(AccessError::ResourceNotFound(_)) if policy.owner_resolver.is_some() => {
                let (Some(resource_type), Some(resolver)) =
                    (policy.resource_type, policy.owner_resolver.as_ref())
                else {
                    return Err(AccessError::ResourceNotFound(resource_id).into());
                };

                let owner = resolver(state.clone(), resource_id)
                    .await
                    .ok_or(AccessError::ResourceNotFound(resource_id))?;

                state.access.create_resource(CreateResourceParams {
                    resource_type,
                    reference_id: resource_id,
                    owner_id: owner,
                })?;
                debug!(%resource_id, %owner, "resource backfilled");

                // Single retry; its outcome is surfaced as-is
                state
                    .access
                    .assert_has_rights(user.id, resource_id, &policy.rights, allow_owner)?;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

/// Middleware entry point; wire with
/// `middleware::from_fn_with_state((state, Arc::new(policy)), authorize_mw)`
pub async fn authorize_mw(
    State((state, policy)): State<(AppState, Arc<AuthorizePolicy>)>,
    params: RawPathParams,
    user: Option<Extension<AuthUser>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(&policy, &state, user.as_ref().map(|e| &e.0), &params).await?;
    Ok(next.run(request).await)
}
