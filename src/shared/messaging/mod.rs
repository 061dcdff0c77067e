//! Messaging Module
//!
//! This module contains the data structures of the collaboration model:
//!
//! - `Principal` - An authenticated identity with a role
//! - `Room` - An access-controlled collaboration space
//! - `Task` - A task tracked inside a room
//! - `ChatMessage` - A message in a room or conversation
//! - `Conversation` - A direct-message thread between two principals
//! - `FocusSession` - A tracked stretch of focused work
//!
//! # Usage
//!
//! ```rust
//! use huddle::shared::messaging::{Principal, Role, Room};
//!
//! let admin = Principal::new("alice", Role::Admin);
//! let room = Room::new("eng", None, admin.id, [admin.id]).unwrap();
//! assert!(room.is_participant(admin.id));
//! ```

pub mod principal;
pub mod room;
pub mod task;
pub mod message;
pub mod conversation;
pub mod focus;

// Re-export all types
pub use principal::{Principal, PrincipalRecord, Role};
pub use room::{
    CreateRoomRequest, ParticipantPresence, Room, RoomStatus, RoomView,
    UpdateParticipantsRequest,
};
pub use task::{ConvertMessageRequest, CreateTaskRequest, Task, TaskStatus, UpdateTaskRequest};
pub use message::{ChatMessage, MessageTarget, SendMessageRequest};
pub use conversation::{AccessConversationRequest, Conversation, ConversationView};
pub use focus::{FocusSession, FOCUS_STATS_LIMIT};
