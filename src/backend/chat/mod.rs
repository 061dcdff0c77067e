//! Chat Backend Module
//!
//! Persisting and reading chat messages for rooms and direct-message
//! conversations, opening conversations, and finding people to talk to.
//!
//! # Architecture
//!
//! - **`service`** - Message validation, conversation access checks and
//!   persistence
//! - **`handlers`** - HTTP handlers
//!
//! Messages are stored over HTTP and delivered live over the WebSocket
//! relay; the two paths share the store but never each other's state.

/// Message operations
pub mod service;

/// HTTP handlers
pub mod handlers;

pub use handlers::{
    access_conversation, conversation_messages, list_conversations, list_members, search_users,
    send_message,
};
