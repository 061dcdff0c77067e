//! Chat Message Data Structure
//!
//! Represents a message posted either to a room or to a direct-message
//! conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::channel::ChannelKey;
use crate::shared::error::SharedError;
use crate::shared::ids::{ConversationId, MessageId, PrincipalId, RoomId};

/// Maximum message length in characters
pub const MAX_MESSAGE_LEN: usize = 5000;

/// Where a message was posted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum MessageTarget {
    Room(RoomId),
    Conversation(ConversationId),
}

impl MessageTarget {
    /// The channel a message with this target is relayed on
    pub fn channel(&self) -> ChannelKey {
        match self {
            MessageTarget::Room(id) => ChannelKey::room(*id),
            MessageTarget::Conversation(id) => ChannelKey::conversation(*id),
        }
    }

    /// Resolve the target from a pair of optional ids; exactly one must be set
    pub fn from_parts(
        room_id: Option<RoomId>,
        conversation_id: Option<ConversationId>,
    ) -> Result<Self, SharedError> {
        match (room_id, conversation_id) {
            (Some(room), None) => Ok(MessageTarget::Room(room)),
            (None, Some(conversation)) => Ok(MessageTarget::Conversation(conversation)),
            (None, None) => Err(SharedError::validation(
                "target",
                "conversation_id or room_id is required",
            )),
            (Some(_), Some(_)) => Err(SharedError::validation(
                "target",
                "Provide either conversation_id or room_id, not both",
            )),
        }
    }
}

/// Represents a persisted chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    pub id: MessageId,
    /// Principal who sent the message
    pub sender: PrincipalId,
    /// Room or conversation the message belongs to
    pub target: MessageTarget,
    /// Message text
    pub text: String,
    /// When the message was stored
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a validated message
    pub fn new(sender: PrincipalId, target: MessageTarget, text: &str) -> Result<Self, SharedError> {
        if text.trim().is_empty() {
            return Err(SharedError::validation("content", "content is required"));
        }
        if text.chars().count() > MAX_MESSAGE_LEN {
            return Err(SharedError::validation(
                "content",
                format!("Message cannot exceed {} characters", MAX_MESSAGE_LEN),
            ));
        }
        Ok(Self {
            id: MessageId::new(),
            sender,
            target,
            text: text.to_string(),
            created_at: Utc::now(),
        })
    }

    /// The room this message belongs to, if any
    pub fn room_id(&self) -> Option<RoomId> {
        match self.target {
            MessageTarget::Room(id) => Some(id),
            MessageTarget::Conversation(_) => None,
        }
    }
}

/// Request to send a message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
    pub conversation_id: Option<ConversationId>,
    pub room_id: Option<RoomId>,
}

impl SendMessageRequest {
    /// Resolve where the message goes
    pub fn target(&self) -> Result<MessageTarget, SharedError> {
        MessageTarget::from_parts(self.room_id, self.conversation_id)
    }
}
