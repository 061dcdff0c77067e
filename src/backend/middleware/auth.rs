/**
 * Authentication Extractor
 *
 * Resolves the bearer token on a request to a stored principal. Handlers
 * that take `AuthUser` are only reached by authenticated callers; any
 * failure rejects the request with 401.
 */

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::backend::auth::sessions::verify_token;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::ids::PrincipalId;
use crate::shared::messaging::Principal;

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Axum extractor for the authenticated principal
///
/// The principal is reloaded from the store so the role is the persisted
/// one, not whatever the token carried.
#[derive(Clone, Debug)]
pub struct AuthUser(pub Principal);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or_else(|| {
            tracing::warn!("[Auth] Missing Authorization header");
            BackendError::unauthorized("Missing authentication token")
        })?;

        let claims = verify_token(&token, &state.config.auth.jwt_secret).map_err(|e| {
            tracing::warn!("[Auth] Invalid token: {}", e);
            BackendError::unauthorized("Invalid or expired token")
        })?;

        let principal_id = claims
            .sub
            .parse::<PrincipalId>()
            .map_err(|_| BackendError::unauthorized("Invalid token subject"))?;

        let record = state
            .store
            .find_principal(principal_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!("[Auth] Token for unknown principal {}", principal_id);
                BackendError::unauthorized("Unknown principal")
            })?;

        Ok(AuthUser(record.principal))
    }
}
