//! Focus HTTP Handlers

use axum::{extract::State, http::StatusCode, Json};

use super::service;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::messaging::FocusSession;

/// `POST /api/focus/start`
pub async fn start_focus(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<(StatusCode, Json<FocusSession>), BackendError> {
    let session = service::start_session(state.store.as_ref(), &principal).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// `POST /api/focus/stop`
///
/// Responds `null` when no session was active.
pub async fn stop_focus(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Option<FocusSession>>, BackendError> {
    Ok(Json(service::stop_session(state.store.as_ref(), &principal).await?))
}

/// `GET /api/focus/stats`
pub async fn focus_stats(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<FocusSession>>, BackendError> {
    Ok(Json(service::session_stats(state.store.as_ref(), &principal).await?))
}
