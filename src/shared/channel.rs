//! Channel Keys
//!
//! A channel key is the routing identifier for event delivery. It always
//! carries its kind next to the id, so a room is never mistaken for a
//! conversation no matter what the id looks like.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::shared::ids::{ConversationId, PrincipalId, RoomId};

/// Namespace of a channel key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// A principal's own channel, used for non-room notifications
    Personal,
    /// A direct-message conversation
    Conversation,
    /// An access-controlled project room
    Room,
}

impl ChannelKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Personal => "personal",
            ChannelKind::Conversation => "conversation",
            ChannelKind::Room => "room",
        }
    }
}

/// Tagged routing key: `{ "kind": "room", "id": "<uuid>" }`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    /// Namespace of `id`
    pub kind: ChannelKind,
    /// Identifier within the namespace
    pub id: Uuid,
}

impl ChannelKey {
    /// Personal channel of a principal
    pub fn personal(id: PrincipalId) -> Self {
        Self {
            kind: ChannelKind::Personal,
            id: id.as_uuid(),
        }
    }

    /// Channel of a direct-message conversation
    pub fn conversation(id: ConversationId) -> Self {
        Self {
            kind: ChannelKind::Conversation,
            id: id.as_uuid(),
        }
    }

    /// Channel of a project room
    pub fn room(id: RoomId) -> Self {
        Self {
            kind: ChannelKind::Room,
            id: id.as_uuid(),
        }
    }

    /// The room id, if this is a room channel
    pub fn room_id(&self) -> Option<RoomId> {
        match self.kind {
            ChannelKind::Room => Some(RoomId(self.id)),
            _ => None,
        }
    }

    /// The owning principal, if this is a personal channel
    pub fn personal_owner(&self) -> Option<PrincipalId> {
        match self.kind {
            ChannelKind::Personal => Some(PrincipalId(self.id)),
            _ => None,
        }
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}
