//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the server and its clients. These types are used for serialization over
//! the WebSocket protocol and the JSON HTTP API.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types. Nothing in here
//! touches the network, the database or the connection registry.

/// Canonical identifier types
pub mod ids;

/// Tagged channel keys for event routing
pub mod channel;

/// Real-time wire events
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Principals, rooms, tasks and messages
pub mod messaging;

/// Re-export commonly used types for convenience
pub use ids::{
    ConnectionId, ConversationId, FocusSessionId, MessageId, PrincipalId, RoomId, TaskId,
};
pub use channel::{ChannelKey, ChannelKind};
pub use event::{ClientEvent, EventType, RealtimeEvent};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
