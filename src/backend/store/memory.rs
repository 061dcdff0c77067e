/**
 * In-Memory Store
 *
 * `MemoryStore` keeps every entity in a `HashMap` behind a
 * `tokio::sync::RwLock`. It is used when no database is configured and by
 * the test suite.
 *
 * # Failure Injection
 *
 * `fail_presence_updates(true)` makes `set_principal_online` return
 * `StoreError::Unavailable`, so tests can show that presence marking failures
 * never disturb the connection lifecycle.
 *
 * Two latency knobs widen race windows for concurrency tests:
 *
 * - `delay_offline_marks` sleeps before every offline presence write
 * - `stall_next_room_lookup` makes the next `find_room` read the room and
 *   then sleep before answering, so the answer can go stale
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

use super::{sort_tasks, Store, StoreError};
use crate::shared::ids::{ConversationId, MessageId, PrincipalId, RoomId, TaskId};
use crate::shared::messaging::{
    ChatMessage, Conversation, FocusSession, MessageTarget, Principal, PrincipalRecord, Role, Room,
    RoomStatus, Task,
};

#[derive(Debug, Default)]
pub struct MemoryStore {
    principals: RwLock<HashMap<PrincipalId, PrincipalRecord>>,
    rooms: RwLock<HashMap<RoomId, Room>>,
    // Insertion order breaks ties between equal timestamps
    messages: RwLock<Vec<ChatMessage>>,
    tasks: RwLock<HashMap<TaskId, Task>>,
    conversations: RwLock<HashMap<ConversationId, Conversation>>,
    focus_sessions: RwLock<Vec<FocusSession>>,
    fail_presence: AtomicBool,
    offline_mark_delay_ms: AtomicU64,
    room_lookup_stall_ms: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make presence updates fail until switched back off
    pub fn fail_presence_updates(&self, fail: bool) {
        self.fail_presence.store(fail, Ordering::SeqCst);
    }

    /// Sleep for `delay` before each offline presence write
    pub fn delay_offline_marks(&self, delay: Duration) {
        self.offline_mark_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// The next `find_room` sleeps for `stall` after reading
    pub fn stall_next_room_lookup(&self, stall: Duration) {
        self.room_lookup_stall_ms
            .store(stall.as_millis() as u64, Ordering::SeqCst);
    }
}

fn sort_by_name(records: &mut [PrincipalRecord]) {
    records.sort_by_cached_key(|r| r.principal.display_name.to_lowercase());
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_principal(&self, id: PrincipalId) -> Result<Option<PrincipalRecord>, StoreError> {
        Ok(self.principals.read().await.get(&id).cloned())
    }

    async fn insert_principal(&self, principal: Principal) -> Result<PrincipalRecord, StoreError> {
        let record = PrincipalRecord::from(principal);
        self.principals
            .write()
            .await
            .insert(record.principal.id, record.clone());
        Ok(record)
    }

    async fn set_principal_online(
        &self,
        id: PrincipalId,
        online: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if self.fail_presence.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("presence updates disabled".to_string()));
        }
        let delay = self.offline_mark_delay_ms.load(Ordering::SeqCst);
        if !online && delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        let mut principals = self.principals.write().await;
        let record = principals
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("principal", id))?;
        record.is_online = online;
        record.last_seen = Some(at);
        Ok(())
    }

    async fn search_principals(
        &self,
        query: &str,
        exclude: PrincipalId,
    ) -> Result<Vec<PrincipalRecord>, StoreError> {
        let needle = query.to_lowercase();
        let mut found: Vec<PrincipalRecord> = self
            .principals
            .read()
            .await
            .values()
            .filter(|r| r.principal.id != exclude)
            .filter(|r| r.principal.display_name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        sort_by_name(&mut found);
        Ok(found)
    }

    async fn principals_with_role(&self, role: Role) -> Result<Vec<PrincipalRecord>, StoreError> {
        let mut found: Vec<PrincipalRecord> = self
            .principals
            .read()
            .await
            .values()
            .filter(|r| r.principal.role == role)
            .cloned()
            .collect();
        sort_by_name(&mut found);
        Ok(found)
    }

    async fn find_room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        let room = self.rooms.read().await.get(&id).cloned();
        let stall = self.room_lookup_stall_ms.swap(0, Ordering::SeqCst);
        if stall > 0 {
            tokio::time::sleep(Duration::from_millis(stall)).await;
        }
        Ok(room)
    }

    async fn room_participants(&self, id: RoomId) -> Result<BTreeSet<PrincipalId>, StoreError> {
        Ok(self
            .rooms
            .read()
            .await
            .get(&id)
            .map(|room| room.participants.clone())
            .unwrap_or_default())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let mut rooms: Vec<Room> = self.rooms.read().await.values().cloned().collect();
        rooms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rooms)
    }

    async fn insert_room(&self, room: Room) -> Result<Room, StoreError> {
        self.rooms.write().await.insert(room.id, room.clone());
        Ok(room)
    }

    async fn update_room_participants(
        &self,
        id: RoomId,
        participants: BTreeSet<PrincipalId>,
    ) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("room", id))?;
        room.participants = participants;
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn update_room_status(
        &self,
        id: RoomId,
        status: RoomStatus,
        is_active: bool,
    ) -> Result<Room, StoreError> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("room", id))?;
        room.status = status;
        room.is_active = is_active;
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn delete_room(&self, id: RoomId) -> Result<bool, StoreError> {
        Ok(self.rooms.write().await.remove(&id).is_some())
    }

    async fn insert_message(&self, message: ChatMessage) -> Result<ChatMessage, StoreError> {
        self.messages.write().await.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: MessageId) -> Result<Option<ChatMessage>, StoreError> {
        Ok(self.messages.read().await.iter().find(|m| m.id == id).cloned())
    }

    async fn messages_for_room(&self, id: RoomId) -> Result<Vec<ChatMessage>, StoreError> {
        let mut messages: Vec<ChatMessage> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.target == MessageTarget::Room(id))
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn messages_for_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let mut messages: Vec<ChatMessage> = self
            .messages
            .read()
            .await
            .iter()
            .filter(|m| m.target == MessageTarget::Conversation(id))
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }

    async fn delete_messages_for_room(&self, id: RoomId) -> Result<u64, StoreError> {
        let mut messages = self.messages.write().await;
        let before = messages.len();
        messages.retain(|m| m.target != MessageTarget::Room(id));
        Ok((before - messages.len()) as u64)
    }

    async fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError> {
        Ok(self.conversations.read().await.get(&id).cloned())
    }

    async fn find_conversation_between(
        &self,
        a: PrincipalId,
        b: PrincipalId,
    ) -> Result<Option<Conversation>, StoreError> {
        let pair: BTreeSet<PrincipalId> = [a, b].into_iter().collect();
        Ok(self
            .conversations
            .read()
            .await
            .values()
            .find(|c| c.participants == pair)
            .cloned())
    }

    async fn insert_conversation(&self, conversation: Conversation) -> Result<Conversation, StoreError> {
        self.conversations
            .write()
            .await
            .insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn conversations_for(&self, principal_id: PrincipalId) -> Result<Vec<Conversation>, StoreError> {
        let mut found: Vec<Conversation> = self
            .conversations
            .read()
            .await
            .values()
            .filter(|c| c.is_participant(principal_id))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(found)
    }

    async fn touch_conversation(
        &self,
        id: ConversationId,
        message_id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("conversation", id))?;
        conversation.last_message = Some(message_id);
        conversation.updated_at = at;
        Ok(())
    }

    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.read().await.get(&id).cloned())
    }

    async fn update_task(&self, task: Task) -> Result<Task, StoreError> {
        let mut tasks = self.tasks.write().await;
        let slot = tasks
            .get_mut(&task.id)
            .ok_or_else(|| StoreError::not_found("task", task.id))?;
        *slot = task.clone();
        Ok(task)
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool, StoreError> {
        Ok(self.tasks.write().await.remove(&id).is_some())
    }

    async fn tasks_for_room(&self, id: RoomId) -> Result<Vec<Task>, StoreError> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .await
            .values()
            .filter(|t| t.room_id == id)
            .cloned()
            .collect();
        sort_tasks(&mut tasks);
        Ok(tasks)
    }

    async fn delete_tasks_for_room(&self, id: RoomId) -> Result<u64, StoreError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| t.room_id != id);
        Ok((before - tasks.len()) as u64)
    }

    async fn start_focus_session(&self, session: FocusSession) -> Result<FocusSession, StoreError> {
        let mut sessions = self.focus_sessions.write().await;
        for active in sessions
            .iter_mut()
            .filter(|s| s.principal_id == session.principal_id && s.is_active)
        {
            active.finish(session.start_time);
        }
        sessions.push(session.clone());
        Ok(session)
    }

    async fn stop_focus_session(
        &self,
        principal_id: PrincipalId,
        at: DateTime<Utc>,
    ) -> Result<Option<FocusSession>, StoreError> {
        let mut sessions = self.focus_sessions.write().await;
        Ok(sessions
            .iter_mut()
            .find(|s| s.principal_id == principal_id && s.is_active)
            .map(|active| {
                active.finish(at);
                active.clone()
            }))
    }

    async fn focus_sessions_for(
        &self,
        principal_id: PrincipalId,
        limit: usize,
    ) -> Result<Vec<FocusSession>, StoreError> {
        // Pushed in creation order, so newest is last
        Ok(self
            .focus_sessions
            .read()
            .await
            .iter()
            .rev()
            .filter(|s| s.principal_id == principal_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn increment_focus_messages(&self, principal_id: PrincipalId) -> Result<bool, StoreError> {
        let mut sessions = self.focus_sessions.write().await;
        match sessions
            .iter_mut()
            .find(|s| s.principal_id == principal_id && s.is_active)
        {
            Some(active) => {
                active.message_count += 1;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
