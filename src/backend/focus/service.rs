//! Focus session operations

use chrono::Utc;

use crate::backend::error::BackendError;
use crate::backend::store::Store;
use crate::shared::messaging::{FocusSession, Principal, FOCUS_STATS_LIMIT};

/// Start a session now, ending any session already active
pub async fn start_session(store: &dyn Store, principal: &Principal) -> Result<FocusSession, BackendError> {
    let session = store.start_focus_session(FocusSession::start(principal.id)).await?;
    tracing::info!("[Focus] {} started session {}", principal.id, session.id);
    Ok(session)
}

/// Stop the active session; `None` when nothing was running
pub async fn stop_session(
    store: &dyn Store,
    principal: &Principal,
) -> Result<Option<FocusSession>, BackendError> {
    let stopped = store.stop_focus_session(principal.id, Utc::now()).await?;
    match &stopped {
        Some(session) => tracing::info!(
            "[Focus] {} stopped session {} after {} message(s)",
            principal.id,
            session.id,
            session.message_count
        ),
        None => tracing::debug!("[Focus] {} had no active session to stop", principal.id),
    }
    Ok(stopped)
}

/// The most recent sessions, newest first
pub async fn session_stats(
    store: &dyn Store,
    principal: &Principal,
) -> Result<Vec<FocusSession>, BackendError> {
    Ok(store.focus_sessions_for(principal.id, FOCUS_STATS_LIMIT).await?)
}
