//! # Authentication Boundary
//!
//! Verifies the bearer token and attaches the caller identity to the
//! request. Everything past this middleware trusts the identity
//! unconditionally; issuing tokens is the identity provider's job, not
//! this service's.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ApiError;
use super::server::AppState;

/// Authenticated caller identity, inserted as a request extension
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub provider: String,
}

/// JWT claims carried by the bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    /// Identity provider that vouched for this user
    #[serde(default)]
    pub provider: String,
    pub exp: i64,
    pub iat: i64,
}

/// Verify an HS256 bearer token and extract the caller identity
pub fn verify_token(token: &str, secret: &str) -> Result<AuthUser, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::Unauthenticated)?;

    let id = Uuid::parse_str(&data.claims.sub).map_err(|_| ApiError::Unauthenticated)?;

    Ok(AuthUser {
        id,
        email: data.claims.email,
        provider: data.claims.provider,
    })
}

/// Mint a token for `user`. Used by tests and local tooling; production
/// tokens come from the external identity provider.
pub fn issue_token(
    user_id: Uuid,
    email: &str,
    provider: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        provider: provider.to_string(),
        exp: now + ttl_secs,
        iat: now,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::BadRequest(format!("token encoding failed: {}", e)))
}

/// Middleware requiring a valid bearer token on every request
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    let user = verify_token(token, &state.jwt_secret)?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
