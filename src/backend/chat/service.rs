//! Message and conversation operations
//!
//! Messages go either to a room or to a direct-message conversation, never
//! both. Room messages follow the room access rule. Conversation messages
//! and history require the conversation to exist (404) and the caller to be
//! one of its two participants (403).
//!
//! A sent message moves its conversation's `updated_at` forward and counts
//! against the sender's active focus session, if any.

use crate::backend::error::BackendError;
use crate::backend::rooms::service::accessible_room;
use crate::backend::store::Store;
use crate::shared::ids::ConversationId;
use crate::shared::messaging::{
    AccessConversationRequest, ChatMessage, Conversation, ConversationView, MessageTarget,
    Principal, PrincipalRecord, Role, SendMessageRequest,
};

/// Load a conversation the principal takes part in: 404 when missing, then 403
pub async fn participating_conversation(
    store: &dyn Store,
    principal: &Principal,
    conversation_id: ConversationId,
) -> Result<Conversation, BackendError> {
    let conversation = store
        .find_conversation(conversation_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Conversation not found"))?;
    if !conversation.is_participant(principal.id) {
        return Err(BackendError::forbidden("Not a participant of this conversation"));
    }
    Ok(conversation)
}

/// Persist a message from `principal`
///
/// Validation order: content, then target, then access to the target.
pub async fn send_message(
    store: &dyn Store,
    principal: &Principal,
    request: SendMessageRequest,
) -> Result<ChatMessage, BackendError> {
    if request.content.trim().is_empty() {
        return Err(BackendError::bad_request("content", "content is required"));
    }
    let target = request.target()?;

    match target {
        MessageTarget::Room(room_id) => {
            accessible_room(store, principal, room_id).await?;
        }
        MessageTarget::Conversation(conversation_id) => {
            participating_conversation(store, principal, conversation_id).await?;
        }
    }

    let message = ChatMessage::new(principal.id, target, &request.content)?;
    let message = store.insert_message(message).await?;
    if let MessageTarget::Conversation(conversation_id) = target {
        store
            .touch_conversation(conversation_id, message.id, message.created_at)
            .await?;
    }
    tracing::debug!(
        "[Chat] {} posted {} to {}",
        principal.id,
        message.id,
        target.channel()
    );

    if let Err(e) = store.increment_focus_messages(principal.id).await {
        tracing::warn!("[Chat] Could not count message against focus session of {}: {}", principal.id, e);
    }
    Ok(message)
}

/// Conversation history, oldest first
pub async fn conversation_messages(
    store: &dyn Store,
    principal: &Principal,
    conversation_id: ConversationId,
) -> Result<Vec<ChatMessage>, BackendError> {
    let conversation = participating_conversation(store, principal, conversation_id).await?;
    Ok(store.messages_for_conversation(conversation.id).await?)
}

/// Find the conversation between `principal` and `request.user_id`, opening
/// one if none exists
///
/// Returns the conversation and whether it was just created.
pub async fn access_conversation(
    store: &dyn Store,
    principal: &Principal,
    request: AccessConversationRequest,
) -> Result<(ConversationView, bool), BackendError> {
    let other = request
        .user_id
        .ok_or_else(|| BackendError::bad_request("user_id", "user_id is required"))?;

    let conversation = Conversation::between(principal.id, other)?;

    if let Some(existing) = store.find_conversation_between(principal.id, other).await? {
        return Ok((conversation_view(store, existing).await?, false));
    }
    if store.find_principal(other).await?.is_none() {
        return Err(BackendError::not_found("User not found"));
    }
    let conversation = store.insert_conversation(conversation).await?;
    tracing::info!(
        "[Chat] Opened conversation {} between {} and {}",
        conversation.id,
        principal.id,
        other
    );
    Ok((conversation_view(store, conversation).await?, true))
}

/// Conversations of `principal`, most recently active first
pub async fn list_conversations(
    store: &dyn Store,
    principal: &Principal,
) -> Result<Vec<ConversationView>, BackendError> {
    let mut views = Vec::new();
    for conversation in store.conversations_for(principal.id).await? {
        views.push(conversation_view(store, conversation).await?);
    }
    Ok(views)
}

async fn conversation_view(
    store: &dyn Store,
    conversation: Conversation,
) -> Result<ConversationView, BackendError> {
    let mut participants = Vec::with_capacity(conversation.participants.len());
    for &id in &conversation.participants {
        if let Some(record) = store.find_principal(id).await? {
            participants.push(record);
        }
    }
    let last_message = match conversation.last_message {
        Some(id) => store.find_message(id).await?,
        None => None,
    };
    Ok(ConversationView {
        id: conversation.id,
        participants,
        last_message,
        created_at: conversation.created_at,
        updated_at: conversation.updated_at,
    })
}

/// Principals other than the caller whose name contains `query`
pub async fn search_users(
    store: &dyn Store,
    principal: &Principal,
    query: &str,
) -> Result<Vec<PrincipalRecord>, BackendError> {
    Ok(store.search_principals(query.trim(), principal.id).await?)
}

/// Every MEMBER principal, by name
pub async fn list_members(store: &dyn Store) -> Result<Vec<PrincipalRecord>, BackendError> {
    Ok(store.principals_with_role(Role::Member).await?)
}
