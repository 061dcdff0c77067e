//! Persisted-Entity Store
//!
//! The data-access interface the real-time core and the request handlers
//! call into. Two implementations are provided:
//!
//! - **`memory`** - `MemoryStore`, lock-guarded maps; used when no database
//!   is configured and throughout the tests
//! - **`postgres`** - `PgStore`, backed by a `sqlx::PgPool`
//!
//! The store is shared as `Arc<dyn Store>` so handlers and the realtime hub
//! never know which backend is in use.
//!
//! # Ordering
//!
//! - `list_rooms` and `conversations_for` return the most recently updated
//!   first
//! - `search_principals` and `principals_with_role` sort by display name,
//!   ignoring case
//! - `focus_sessions_for` returns the newest session first
//! - `messages_for_room` / `messages_for_conversation` return oldest first
//! - `tasks_for_room` orders by deadline ascending with undated tasks first,
//!   then newest first

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::shared::ids::{ConversationId, MessageId, PrincipalId, RoomId, TaskId};
use crate::shared::messaging::{
    ChatMessage, Conversation, FocusSession, Principal, PrincipalRecord, Role, Room, RoomStatus,
    Task,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// What a room deletion removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub messages: u64,
    pub tasks: u64,
    pub room_deleted: bool,
}

#[async_trait]
pub trait Store: Send + Sync {
    // Principals

    async fn find_principal(&self, id: PrincipalId) -> Result<Option<PrincipalRecord>, StoreError>;

    async fn insert_principal(&self, principal: Principal) -> Result<PrincipalRecord, StoreError>;

    /// Record presence. Callers on the connection lifecycle path log and
    /// swallow failures.
    async fn set_principal_online(
        &self,
        id: PrincipalId,
        online: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Principals whose display name contains `query`, ignoring case,
    /// except `exclude`
    async fn search_principals(
        &self,
        query: &str,
        exclude: PrincipalId,
    ) -> Result<Vec<PrincipalRecord>, StoreError>;

    async fn principals_with_role(&self, role: Role) -> Result<Vec<PrincipalRecord>, StoreError>;

    // Rooms

    async fn find_room(&self, id: RoomId) -> Result<Option<Room>, StoreError>;

    /// Participant set of a room; empty when the room does not exist
    async fn room_participants(&self, id: RoomId) -> Result<BTreeSet<PrincipalId>, StoreError>;

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError>;

    async fn insert_room(&self, room: Room) -> Result<Room, StoreError>;

    async fn update_room_participants(
        &self,
        id: RoomId,
        participants: BTreeSet<PrincipalId>,
    ) -> Result<Room, StoreError>;

    async fn update_room_status(
        &self,
        id: RoomId,
        status: RoomStatus,
        is_active: bool,
    ) -> Result<Room, StoreError>;

    /// Returns whether a room was removed
    async fn delete_room(&self, id: RoomId) -> Result<bool, StoreError>;

    // Messages

    async fn insert_message(&self, message: ChatMessage) -> Result<ChatMessage, StoreError>;

    async fn find_message(&self, id: MessageId) -> Result<Option<ChatMessage>, StoreError>;

    async fn messages_for_room(&self, id: RoomId) -> Result<Vec<ChatMessage>, StoreError>;

    async fn messages_for_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError>;

    /// Returns the number of messages removed
    async fn delete_messages_for_room(&self, id: RoomId) -> Result<u64, StoreError>;

    // Conversations

    async fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError>;

    /// The conversation whose participants are exactly `a` and `b`
    async fn find_conversation_between(
        &self,
        a: PrincipalId,
        b: PrincipalId,
    ) -> Result<Option<Conversation>, StoreError>;

    async fn insert_conversation(&self, conversation: Conversation) -> Result<Conversation, StoreError>;

    async fn conversations_for(&self, principal_id: PrincipalId) -> Result<Vec<Conversation>, StoreError>;

    /// Record `message_id` as the latest message and bump `updated_at`
    async fn touch_conversation(
        &self,
        id: ConversationId,
        message_id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    // Tasks

    async fn insert_task(&self, task: Task) -> Result<Task, StoreError>;

    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError>;

    async fn update_task(&self, task: Task) -> Result<Task, StoreError>;

    async fn delete_task(&self, id: TaskId) -> Result<bool, StoreError>;

    async fn tasks_for_room(&self, id: RoomId) -> Result<Vec<Task>, StoreError>;

    /// Returns the number of tasks removed
    async fn delete_tasks_for_room(&self, id: RoomId) -> Result<u64, StoreError>;

    // Focus sessions

    /// End any active session of the principal, then store `session`
    async fn start_focus_session(&self, session: FocusSession) -> Result<FocusSession, StoreError>;

    /// End the active session, if there is one, and return it
    async fn stop_focus_session(
        &self,
        principal_id: PrincipalId,
        at: DateTime<Utc>,
    ) -> Result<Option<FocusSession>, StoreError>;

    async fn focus_sessions_for(
        &self,
        principal_id: PrincipalId,
        limit: usize,
    ) -> Result<Vec<FocusSession>, StoreError>;

    /// Count one message against the active session; false when none is active
    async fn increment_focus_messages(&self, principal_id: PrincipalId) -> Result<bool, StoreError>;

    /// Remove a room's messages, then its tasks, then the room itself
    ///
    /// The default runs three independent calls. Stores with transactions
    /// override this so the cascade is all-or-nothing.
    async fn delete_room_cascade(&self, id: RoomId) -> Result<CascadeSummary, StoreError> {
        let messages = self.delete_messages_for_room(id).await?;
        let tasks = self.delete_tasks_for_room(id).await?;
        let room_deleted = self.delete_room(id).await?;
        Ok(CascadeSummary {
            messages,
            tasks,
            room_deleted,
        })
    }
}

/// Sort tasks by deadline ascending, undated first, then newest first
///
/// `None < Some(_)`, which is where a null deadline sorts in an ascending
/// index scan with `NULLS FIRST`.
pub(crate) fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.deadline
            .cmp(&b.deadline)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
