/**
 * PostgreSQL Store
 *
 * `PgStore` persists principals, rooms, messages, tasks, conversations and
 * focus sessions with `sqlx`.
 * Schema lives in `migrations/` and is applied by `connect`.
 *
 * Rows are read into private `FromRow` structs and converted into the shared
 * data model; a row that fails conversion (an unknown role or status string)
 * surfaces as `StoreError::Corrupt` rather than a panic.
 *
 * Room deletion overrides the trait default and runs the whole cascade in
 * one transaction. Starting a focus session ends the previous one in the
 * same transaction; a partial unique index keeps one active session per
 * principal.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;

use super::{CascadeSummary, Store, StoreError};
use crate::shared::ids::{ConversationId, FocusSessionId, MessageId, PrincipalId, RoomId, TaskId};
use crate::shared::messaging::{
    ChatMessage, Conversation, FocusSession, MessageTarget, Principal, PrincipalRecord, Role, Room,
    RoomStatus, Task,
};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and run migrations
    ///
    /// Migration failures are logged and tolerated; the schema may already
    /// be in place.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        tracing::info!("[Store] Connecting to database...");
        let pool = PgPool::connect(database_url).await?;
        tracing::info!("[Store] Database connection pool created successfully");

        match sqlx::migrate!().run(&pool).await {
            Ok(_) => tracing::info!("[Store] Database migrations completed successfully"),
            Err(e) => {
                tracing::error!("[Store] Failed to run database migrations: {}", e);
                tracing::warn!("[Store] Continuing without migrations - database might not be up to date");
            }
        }

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct PrincipalRow {
    id: Uuid,
    role: String,
    display_name: String,
    is_online: bool,
    last_seen: Option<DateTime<Utc>>,
}

impl TryFrom<PrincipalRow> for PrincipalRecord {
    type Error = StoreError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        Ok(PrincipalRecord {
            principal: Principal {
                id: PrincipalId(row.id),
                role: row.role.parse().map_err(corrupt)?,
                display_name: row.display_name,
            },
            is_online: row.is_online,
            last_seen: row.last_seen,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    created_by: Uuid,
    participants: Vec<Uuid>,
    status: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RoomRow> for Room {
    type Error = StoreError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Room {
            id: RoomId(row.id),
            name: row.name,
            description: row.description,
            created_by: PrincipalId(row.created_by),
            participants: row.participants.into_iter().map(PrincipalId).collect(),
            status: row.status.parse().map_err(corrupt)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    sender_id: Uuid,
    room_id: Option<Uuid>,
    conversation_id: Option<Uuid>,
    text: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for ChatMessage {
    type Error = StoreError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let target = MessageTarget::from_parts(
            row.room_id.map(RoomId),
            row.conversation_id.map(ConversationId),
        )
        .map_err(corrupt)?;
        Ok(ChatMessage {
            id: MessageId(row.id),
            sender: PrincipalId(row.sender_id),
            target,
            text: row.text,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: Uuid,
    room_id: Uuid,
    title: String,
    description: Option<String>,
    assigned_to: Option<Uuid>,
    status: String,
    deadline: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_by: Uuid,
    source_message_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Task {
            id: TaskId(row.id),
            room_id: RoomId(row.room_id),
            title: row.title,
            description: row.description,
            assigned_to: row.assigned_to.map(PrincipalId),
            status: row.status.parse().map_err(corrupt)?,
            deadline: row.deadline,
            completed_at: row.completed_at,
            created_by: PrincipalId(row.created_by),
            source_message_id: row.source_message_id.map(MessageId),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ConversationRow {
    id: Uuid,
    participants: Vec<Uuid>,
    last_message_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ConversationRow> for Conversation {
    type Error = StoreError;

    fn try_from(row: ConversationRow) -> Result<Self, Self::Error> {
        Ok(Conversation {
            id: ConversationId(row.id),
            participants: row.participants.into_iter().map(PrincipalId).collect(),
            last_message: row.last_message_id.map(MessageId),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FocusSessionRow {
    id: Uuid,
    principal_id: Uuid,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    message_count: i32,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<FocusSessionRow> for FocusSession {
    type Error = StoreError;

    fn try_from(row: FocusSessionRow) -> Result<Self, Self::Error> {
        Ok(FocusSession {
            id: FocusSessionId(row.id),
            principal_id: PrincipalId(row.principal_id),
            start_time: row.start_time,
            end_time: row.end_time,
            message_count: u32::try_from(row.message_count).map_err(corrupt)?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

/// `%query%` for ILIKE, with the pattern metacharacters escaped
fn contains_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn corrupt(err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(err.to_string())
}

fn collect<R, T>(rows: Vec<R>) -> Result<Vec<T>, StoreError>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

const ROOM_COLUMNS: &str =
    "id, name, description, created_by, participants, status, is_active, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, sender_id, room_id, conversation_id, text, created_at";
const PRINCIPAL_COLUMNS: &str = "id, role, display_name, is_online, last_seen";
const CONVERSATION_COLUMNS: &str = "id, participants, last_message_id, created_at, updated_at";
const FOCUS_COLUMNS: &str =
    "id, principal_id, start_time, end_time, message_count, is_active, created_at";
const TASK_COLUMNS: &str = "id, room_id, title, description, assigned_to, status, deadline, \
     completed_at, created_by, source_message_id, created_at, updated_at";

#[async_trait]
impl Store for PgStore {
    async fn find_principal(&self, id: PrincipalId) -> Result<Option<PrincipalRecord>, StoreError> {
        let row = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {} FROM principals WHERE id = $1",
            PRINCIPAL_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(PrincipalRecord::try_from).transpose()
    }

    async fn insert_principal(&self, principal: Principal) -> Result<PrincipalRecord, StoreError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            INSERT INTO principals (id, role, display_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET display_name = EXCLUDED.display_name
            RETURNING id, role, display_name, is_online, last_seen
            "#,
        )
        .bind(principal.id.as_uuid())
        .bind(principal.role.as_str())
        .bind(&principal.display_name)
        .fetch_one(&self.pool)
        .await?;
        PrincipalRecord::try_from(row)
    }

    async fn set_principal_online(
        &self,
        id: PrincipalId,
        online: bool,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE principals SET is_online = $2, last_seen = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(online)
            .bind(at)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("principal", id));
        }
        Ok(())
    }

    async fn search_principals(
        &self,
        query: &str,
        exclude: PrincipalId,
    ) -> Result<Vec<PrincipalRecord>, StoreError> {
        let rows = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {} FROM principals WHERE id <> $1 AND display_name ILIKE $2 ORDER BY LOWER(display_name)",
            PRINCIPAL_COLUMNS
        ))
        .bind(exclude.as_uuid())
        .bind(contains_pattern(query))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn principals_with_role(&self, role: Role) -> Result<Vec<PrincipalRecord>, StoreError> {
        let rows = sqlx::query_as::<_, PrincipalRow>(&format!(
            "SELECT {} FROM principals WHERE role = $1 ORDER BY LOWER(display_name)",
            PRINCIPAL_COLUMNS
        ))
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn find_room(&self, id: RoomId) -> Result<Option<Room>, StoreError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {} FROM rooms WHERE id = $1",
            ROOM_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Room::try_from).transpose()
    }

    async fn room_participants(&self, id: RoomId) -> Result<BTreeSet<PrincipalId>, StoreError> {
        let participants: Option<Vec<Uuid>> =
            sqlx::query_scalar("SELECT participants FROM rooms WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        Ok(participants
            .unwrap_or_default()
            .into_iter()
            .map(PrincipalId)
            .collect())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, StoreError> {
        let rows = sqlx::query_as::<_, RoomRow>(&format!(
            "SELECT {} FROM rooms ORDER BY updated_at DESC",
            ROOM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn insert_room(&self, room: Room) -> Result<Room, StoreError> {
        let participants: Vec<Uuid> = room.participants.iter().map(|p| p.as_uuid()).collect();
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            r#"
            INSERT INTO rooms ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {columns}
            "#,
            columns = ROOM_COLUMNS
        ))
        .bind(room.id.as_uuid())
        .bind(&room.name)
        .bind(&room.description)
        .bind(room.created_by.as_uuid())
        .bind(&participants)
        .bind(room.status.as_str())
        .bind(room.is_active)
        .bind(room.created_at)
        .bind(room.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Room::try_from(row)
    }

    async fn update_room_participants(
        &self,
        id: RoomId,
        participants: BTreeSet<PrincipalId>,
    ) -> Result<Room, StoreError> {
        let participants: Vec<Uuid> = participants.iter().map(|p| p.as_uuid()).collect();
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "UPDATE rooms SET participants = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ROOM_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(&participants)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Room::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("room", id))
    }

    async fn update_room_status(
        &self,
        id: RoomId,
        status: RoomStatus,
        is_active: bool,
    ) -> Result<Room, StoreError> {
        let row = sqlx::query_as::<_, RoomRow>(&format!(
            "UPDATE rooms SET status = $2, is_active = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            ROOM_COLUMNS
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Room::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("room", id))
    }

    async fn delete_room(&self, id: RoomId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_message(&self, message: ChatMessage) -> Result<ChatMessage, StoreError> {
        let (room_id, conversation_id) = match message.target {
            MessageTarget::Room(id) => (Some(id.as_uuid()), None),
            MessageTarget::Conversation(id) => (None, Some(id.as_uuid())),
        };
        sqlx::query(
            r#"
            INSERT INTO messages (id, sender_id, room_id, conversation_id, text, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(message.id.as_uuid())
        .bind(message.sender.as_uuid())
        .bind(room_id)
        .bind(conversation_id)
        .bind(&message.text)
        .bind(message.created_at)
        .execute(&self.pool)
        .await?;
        Ok(message)
    }

    async fn find_message(&self, id: MessageId) -> Result<Option<ChatMessage>, StoreError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ChatMessage::try_from).transpose()
    }

    async fn messages_for_room(&self, id: RoomId) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages WHERE room_id = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn messages_for_conversation(
        &self,
        id: ConversationId,
    ) -> Result<Vec<ChatMessage>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {} FROM messages WHERE conversation_id = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn delete_messages_for_room(&self, id: RoomId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM messages WHERE room_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_conversation(&self, id: ConversationId) -> Result<Option<Conversation>, StoreError> {
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "SELECT {} FROM conversations WHERE id = $1",
            CONVERSATION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Conversation::try_from).transpose()
    }

    async fn find_conversation_between(
        &self,
        a: PrincipalId,
        b: PrincipalId,
    ) -> Result<Option<Conversation>, StoreError> {
        let pair = vec![a.as_uuid(), b.as_uuid()];
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            "SELECT {} FROM conversations WHERE participants @> $1 AND participants <@ $1 LIMIT 1",
            CONVERSATION_COLUMNS
        ))
        .bind(&pair)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Conversation::try_from).transpose()
    }

    async fn insert_conversation(&self, conversation: Conversation) -> Result<Conversation, StoreError> {
        let participants: Vec<Uuid> = conversation.participants.iter().map(|p| p.as_uuid()).collect();
        let row = sqlx::query_as::<_, ConversationRow>(&format!(
            r#"
            INSERT INTO conversations ({columns})
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {columns}
            "#,
            columns = CONVERSATION_COLUMNS
        ))
        .bind(conversation.id.as_uuid())
        .bind(&participants)
        .bind(conversation.last_message.map(|m| m.as_uuid()))
        .bind(conversation.created_at)
        .bind(conversation.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Conversation::try_from(row)
    }

    async fn conversations_for(&self, principal_id: PrincipalId) -> Result<Vec<Conversation>, StoreError> {
        let rows = sqlx::query_as::<_, ConversationRow>(&format!(
            "SELECT {} FROM conversations WHERE $1 = ANY(participants) ORDER BY updated_at DESC",
            CONVERSATION_COLUMNS
        ))
        .bind(principal_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn touch_conversation(
        &self,
        id: ConversationId,
        message_id: MessageId,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE conversations SET last_message_id = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(message_id.as_uuid())
        .bind(at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("conversation", id));
        }
        Ok(())
    }

    async fn insert_task(&self, task: Task) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            INSERT INTO tasks ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {columns}
            "#,
            columns = TASK_COLUMNS
        ))
        .bind(task.id.as_uuid())
        .bind(task.room_id.as_uuid())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assigned_to.map(|p| p.as_uuid()))
        .bind(task.status.as_str())
        .bind(task.deadline)
        .bind(task.completed_at)
        .bind(task.created_by.as_uuid())
        .bind(task.source_message_id.map(|m| m.as_uuid()))
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Task::try_from(row)
    }

    async fn find_task(&self, id: TaskId) -> Result<Option<Task>, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Task::try_from).transpose()
    }

    async fn update_task(&self, task: Task) -> Result<Task, StoreError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, assigned_to = $4, status = $5,
                deadline = $6, completed_at = $7, updated_at = $8
            WHERE id = $1
            RETURNING {}
            "#,
            TASK_COLUMNS
        ))
        .bind(task.id.as_uuid())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.assigned_to.map(|p| p.as_uuid()))
        .bind(task.status.as_str())
        .bind(task.deadline)
        .bind(task.completed_at)
        .bind(task.updated_at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Task::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("task", task.id))
    }

    async fn delete_task(&self, id: TaskId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn tasks_for_room(&self, id: RoomId) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query_as::<_, TaskRow>(&format!(
            "SELECT {} FROM tasks WHERE room_id = $1 ORDER BY deadline ASC NULLS FIRST, created_at DESC",
            TASK_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn delete_tasks_for_room(&self, id: RoomId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE room_id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn start_focus_session(&self, session: FocusSession) -> Result<FocusSession, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE focus_sessions SET end_time = $2, is_active = FALSE WHERE principal_id = $1 AND is_active",
        )
        .bind(session.principal_id.as_uuid())
        .bind(session.start_time)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, FocusSessionRow>(&format!(
            r#"
            INSERT INTO focus_sessions ({columns})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {columns}
            "#,
            columns = FOCUS_COLUMNS
        ))
        .bind(session.id.as_uuid())
        .bind(session.principal_id.as_uuid())
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(i32::try_from(session.message_count).map_err(corrupt)?)
        .bind(session.is_active)
        .bind(session.created_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        FocusSession::try_from(row)
    }

    async fn stop_focus_session(
        &self,
        principal_id: PrincipalId,
        at: DateTime<Utc>,
    ) -> Result<Option<FocusSession>, StoreError> {
        let row = sqlx::query_as::<_, FocusSessionRow>(&format!(
            r#"
            UPDATE focus_sessions SET end_time = $2, is_active = FALSE
            WHERE principal_id = $1 AND is_active
            RETURNING {}
            "#,
            FOCUS_COLUMNS
        ))
        .bind(principal_id.as_uuid())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;
        row.map(FocusSession::try_from).transpose()
    }

    async fn focus_sessions_for(
        &self,
        principal_id: PrincipalId,
        limit: usize,
    ) -> Result<Vec<FocusSession>, StoreError> {
        let rows = sqlx::query_as::<_, FocusSessionRow>(&format!(
            "SELECT {} FROM focus_sessions WHERE principal_id = $1 ORDER BY created_at DESC LIMIT $2",
            FOCUS_COLUMNS
        ))
        .bind(principal_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn increment_focus_messages(&self, principal_id: PrincipalId) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE focus_sessions SET message_count = message_count + 1 WHERE principal_id = $1 AND is_active",
        )
        .bind(principal_id.as_uuid())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_room_cascade(&self, id: RoomId) -> Result<CascadeSummary, StoreError> {
        let mut tx = self.pool.begin().await?;

        let messages = sqlx::query("DELETE FROM messages WHERE room_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let tasks = sqlx::query("DELETE FROM tasks WHERE room_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let rooms = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(CascadeSummary {
            messages,
            tasks,
            room_deleted: rooms > 0,
        })
    }
}
