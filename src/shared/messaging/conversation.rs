//! Conversation Data Structure
//!
//! A direct-message thread between exactly two principals. At most one
//! conversation exists per pair; `access_conversation` finds it or opens it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::shared::error::SharedError;
use crate::shared::ids::{ConversationId, MessageId, PrincipalId};
use crate::shared::messaging::{ChatMessage, PrincipalRecord};

/// A persisted direct-message conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,
    /// The two principals in the conversation
    pub participants: BTreeSet<PrincipalId>,
    /// Most recent message, if any was sent
    pub last_message: Option<MessageId>,
    pub created_at: DateTime<Utc>,
    /// Moves forward with every message
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Open a conversation between two distinct principals
    pub fn between(a: PrincipalId, b: PrincipalId) -> Result<Self, SharedError> {
        if a == b {
            return Err(SharedError::validation(
                "user_id",
                "Cannot open a conversation with yourself",
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: ConversationId::new(),
            participants: [a, b].into_iter().collect(),
            last_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_participant(&self, principal_id: PrincipalId) -> bool {
        self.participants.contains(&principal_id)
    }

    /// The participant that is not `principal_id`
    pub fn other(&self, principal_id: PrincipalId) -> Option<PrincipalId> {
        self.participants
            .iter()
            .copied()
            .find(|&p| p != principal_id)
    }
}

/// Conversation with its participants and last message resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationView {
    pub id: ConversationId,
    pub participants: Vec<PrincipalRecord>,
    pub last_message: Option<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to find or open the conversation with another principal
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConversationRequest {
    pub user_id: Option<PrincipalId>,
}
