/**
 * Real-time Event System
 *
 * This module defines the frames exchanged over a real-time connection.
 *
 * # Server to Client
 *
 * `RealtimeEvent` is the envelope every server frame uses: an event type,
 * a JSON payload and a timestamp. Constructors exist for each event the
 * server emits.
 *
 * # Client to Server
 *
 * `ClientEvent` is an adjacently tagged enum, `{ "event": ..., "data": ... }`.
 * Frames that do not parse are dropped by the transport.
 */
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::shared::channel::ChannelKey;
use crate::shared::ids::{ConnectionId, ConversationId, PrincipalId, RoomId};
use crate::shared::messaging::Principal;

/// Type of real-time event sent by the server
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Acknowledges a successful `setup`
    Connected,
    /// `setup` was rejected
    SetupError,
    /// A channel join was denied
    JoinChannelError,
    /// A message was posted to a joined channel
    MessageReceived,
    /// Someone started typing in a joined channel
    Typing,
    /// Someone stopped typing in a joined channel
    StopTyping,
    /// A task changed in a joined room
    TaskReceived,
    /// A principal came online (broadcast)
    UserOnline,
    /// A principal went offline (broadcast)
    UserOffline,
    /// A room was deleted (broadcast)
    RoomDeleted,
    /// Reply to a client ping
    Pong,
}

impl EventType {
    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Connected => "connected",
            EventType::SetupError => "setup_error",
            EventType::JoinChannelError => "join_channel_error",
            EventType::MessageReceived => "message_received",
            EventType::Typing => "typing",
            EventType::StopTyping => "stop_typing",
            EventType::TaskReceived => "task_received",
            EventType::UserOnline => "user_online",
            EventType::UserOffline => "user_offline",
            EventType::RoomDeleted => "room_deleted",
            EventType::Pong => "pong",
        }
    }

    /// Whether the event goes to every connection rather than one channel
    pub fn is_broadcast(&self) -> bool {
        matches!(
            self,
            EventType::UserOnline | EventType::UserOffline | EventType::RoomDeleted
        )
    }
}

/// Real-time event delivered to connections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealtimeEvent {
    /// Type of event
    pub event_type: EventType,
    /// Event payload (JSON-serializable data)
    pub payload: Value,
    /// Timestamp when event occurred
    pub timestamp: String,
}

impl RealtimeEvent {
    /// Create a new real-time event
    pub fn new(event_type: EventType, payload: Value) -> Self {
        Self {
            event_type,
            payload,
            timestamp: get_timestamp(),
        }
    }

    /// Acknowledge `setup` with the resolved principal
    pub fn connected(principal: &Principal, connection_id: ConnectionId) -> Self {
        Self::new(
            EventType::Connected,
            serde_json::json!({
                "principal": principal,
                "connection_id": connection_id,
            }),
        )
    }

    /// Reject `setup`
    pub fn setup_error(reason: impl Into<String>) -> Self {
        Self::new(
            EventType::SetupError,
            serde_json::json!({ "reason": reason.into() }),
        )
    }

    /// Deny a channel join
    pub fn join_channel_error(channel: ChannelKey, reason: impl Into<String>) -> Self {
        Self::new(
            EventType::JoinChannelError,
            serde_json::json!({
                "channel": channel,
                "reason": reason.into(),
            }),
        )
    }

    /// Relay a message payload
    pub fn message_received(payload: Value) -> Self {
        Self::new(EventType::MessageReceived, payload)
    }

    /// Create a typing event
    pub fn typing(channel: ChannelKey, principal_id: PrincipalId, is_typing: bool) -> Self {
        let event_type = if is_typing {
            EventType::Typing
        } else {
            EventType::StopTyping
        };
        Self::new(
            event_type,
            serde_json::json!({
                "channel": channel,
                "principal_id": principal_id,
            }),
        )
    }

    /// Relay a changed task
    pub fn task_received(task: Value) -> Self {
        Self::new(EventType::TaskReceived, task)
    }

    /// Announce a principal coming online
    pub fn user_online(principal_id: PrincipalId) -> Self {
        Self::new(
            EventType::UserOnline,
            serde_json::json!({ "principal_id": principal_id }),
        )
    }

    /// Announce a principal going offline
    pub fn user_offline(principal_id: PrincipalId) -> Self {
        Self::new(
            EventType::UserOffline,
            serde_json::json!({ "principal_id": principal_id }),
        )
    }

    /// Announce a deleted room
    pub fn room_deleted(room_id: RoomId) -> Self {
        Self::new(
            EventType::RoomDeleted,
            serde_json::json!({ "room_id": room_id }),
        )
    }

    /// Reply to a client ping
    pub fn pong() -> Self {
        Self::new(EventType::Pong, Value::Null)
    }
}

/// Payload of `setup`
///
/// The id is kept as raw text so a malformed id can be reported back to
/// the client instead of failing the whole frame.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SetupPayload {
    #[serde(default)]
    pub id: Option<String>,
}

/// A message relayed after it was persisted through the HTTP API
///
/// Exactly one of `room_id` / `conversation_id` selects the channel; every
/// other field is passed through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelayedMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<ConversationId>,
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl RelayedMessage {
    /// The channel this message is relayed on; the room wins if both are set
    pub fn channel(&self) -> Option<ChannelKey> {
        match (self.room_id, self.conversation_id) {
            (Some(room), _) => Some(ChannelKey::room(room)),
            (None, Some(conversation)) => Some(ChannelKey::conversation(conversation)),
            (None, None) => None,
        }
    }
}

/// Payload of `task_changed`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskChangedPayload {
    pub room_id: RoomId,
    pub task: Value,
}

/// Frame sent by a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Bootstrap identity
    Setup(SetupPayload),
    /// Request channel membership
    JoinChannel(ChannelKey),
    /// Relay a just-created message
    PublishMessage(RelayedMessage),
    /// Started typing
    Typing(ChannelKey),
    /// Stopped typing
    StopTyping(ChannelKey),
    /// A task changed in a room
    TaskChanged(TaskChangedPayload),
    /// Application-level liveness check
    Ping,
}

impl ClientEvent {
    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Setup(_) => "setup",
            ClientEvent::JoinChannel(_) => "join_channel",
            ClientEvent::PublishMessage(_) => "publish_message",
            ClientEvent::Typing(_) => "typing",
            ClientEvent::StopTyping(_) => "stop_typing",
            ClientEvent::TaskChanged(_) => "task_changed",
            ClientEvent::Ping => "ping",
        }
    }
}

/// Get the current timestamp as an RFC3339 string
fn get_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
