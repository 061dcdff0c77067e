//! Chat HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::service;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::ids::ConversationId;
use crate::shared::messaging::{
    AccessConversationRequest, ChatMessage, ConversationView, PrincipalRecord, SendMessageRequest,
};

/// Query string of `GET /api/chat/users`
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: String,
}

/// `POST /api/chat/messages`
///
/// Only persists the message. Live delivery happens when the sender relays
/// it with `publish_message` over its WebSocket.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<ChatMessage>, BackendError> {
    Ok(Json(
        service::send_message(state.store.as_ref(), &principal, request).await?,
    ))
}

/// `GET /api/chat/messages/{conversation_id}`
pub async fn conversation_messages(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> Result<Json<Vec<ChatMessage>>, BackendError> {
    Ok(Json(
        service::conversation_messages(state.store.as_ref(), &principal, conversation_id).await?,
    ))
}

/// `POST /api/chat/conversations`
///
/// 201 when a new conversation was opened, 200 when one already existed.
pub async fn access_conversation(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(request): Json<AccessConversationRequest>,
) -> Result<(StatusCode, Json<ConversationView>), BackendError> {
    let (conversation, created) =
        service::access_conversation(state.store.as_ref(), &principal, request).await?;
    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(conversation)))
}

/// `GET /api/chat/conversations`
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<ConversationView>>, BackendError> {
    Ok(Json(
        service::list_conversations(state.store.as_ref(), &principal).await?,
    ))
}

/// `GET /api/chat/users?search=`
pub async fn search_users(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PrincipalRecord>>, BackendError> {
    Ok(Json(
        service::search_users(state.store.as_ref(), &principal, &params.search).await?,
    ))
}

/// `GET /api/chat/members`
pub async fn list_members(
    State(state): State<AppState>,
    AuthUser(_principal): AuthUser,
) -> Result<Json<Vec<PrincipalRecord>>, BackendError> {
    Ok(Json(service::list_members(state.store.as_ref()).await?))
}
