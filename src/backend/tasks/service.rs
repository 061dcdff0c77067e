//! Task operations
//!
//! Tasks inherit their room's access rule: anyone who can enter the room can
//! list, create and update its tasks. Deletion additionally requires being
//! the task's creator or an ADMIN.

use chrono::Utc;

use crate::backend::error::BackendError;
use crate::backend::rooms::service::accessible_room;
use crate::backend::store::Store;
use crate::shared::ids::{RoomId, TaskId};
use crate::shared::messaging::task::derive_task_title;
use crate::shared::messaging::{
    ConvertMessageRequest, CreateTaskRequest, Principal, Task, UpdateTaskRequest,
};

async fn find_task_or_404(store: &dyn Store, task_id: TaskId) -> Result<Task, BackendError> {
    store
        .find_task(task_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Task not found"))
}

/// Create a task in a room
pub async fn create_task(
    store: &dyn Store,
    principal: &Principal,
    room_id: RoomId,
    request: CreateTaskRequest,
) -> Result<Task, BackendError> {
    let room = accessible_room(store, principal, room_id).await?;

    let mut task = Task::new(room.id, &request.title, principal.id)?;
    task.description = request
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    task.assigned_to = request.assigned_to;
    task.deadline = request.deadline;

    let task = store.insert_task(task).await?;
    tracing::info!("[Task] Created {} in room {}", task.id, room.id);
    Ok(task)
}

/// Tasks of a room, undated first, then deadline ascending, then newest first
pub async fn list_tasks(
    store: &dyn Store,
    principal: &Principal,
    room_id: RoomId,
) -> Result<Vec<Task>, BackendError> {
    let room = accessible_room(store, principal, room_id).await?;
    Ok(store.tasks_for_room(room.id).await?)
}

/// Apply a partial update; moving into `Completed` stamps `completed_at`
pub async fn update_task(
    store: &dyn Store,
    principal: &Principal,
    task_id: TaskId,
    request: UpdateTaskRequest,
) -> Result<Task, BackendError> {
    let mut task = find_task_or_404(store, task_id).await?;
    accessible_room(store, principal, task.room_id).await?;

    task.apply_update(request, Utc::now())?;
    let task = store.update_task(task).await?;
    tracing::debug!("[Task] Updated {} ({})", task.id, task.status.as_str());
    Ok(task)
}

/// Turn a chat message into a task
///
/// Without an explicit title the task is named after the start of the
/// message text, or "New task" when there is none.
pub async fn convert_message_to_task(
    store: &dyn Store,
    principal: &Principal,
    request: ConvertMessageRequest,
) -> Result<Task, BackendError> {
    let room = accessible_room(store, principal, request.room_id).await?;

    let message = match request.message_id {
        Some(message_id) => store.find_message(message_id).await?,
        None => None,
    };
    if let Some(message) = &message {
        if message.room_id() != Some(room.id) {
            return Err(BackendError::bad_request(
                "message_id",
                "Message does not belong to this room",
            ));
        }
    }

    let title = derive_task_title(
        request.title.as_deref(),
        message.as_ref().map(|m| m.text.as_str()),
    );
    let mut task = Task::new(room.id, &title, principal.id)?;
    task.source_message_id = request.message_id;
    task.deadline = request.deadline;

    let task = store.insert_task(task).await?;
    tracing::info!(
        "[Task] Converted message {:?} into task {} in room {}",
        request.message_id,
        task.id,
        room.id
    );
    Ok(task)
}

/// Delete a task: room access plus creator or ADMIN
pub async fn delete_task(
    store: &dyn Store,
    principal: &Principal,
    task_id: TaskId,
) -> Result<(), BackendError> {
    let task = find_task_or_404(store, task_id).await?;

    // An orphaned task (room already gone) is judged on ownership alone
    match accessible_room(store, principal, task.room_id).await {
        Ok(_) | Err(BackendError::NotFound { .. }) => {}
        Err(e) => return Err(e),
    }

    if !principal.is_admin() && task.created_by != principal.id {
        return Err(BackendError::forbidden("Only creator or admin can delete task"));
    }

    store.delete_task(task.id).await?;
    tracing::info!("[Task] Deleted {} by {}", task.id, principal.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;
    use crate::shared::messaging::{ChatMessage, MessageTarget, Role, Room, TaskStatus};
    use axum::http::StatusCode;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    struct Fixture {
        store: MemoryStore,
        admin: Principal,
        member: Principal,
        outsider: Principal,
        room: Room,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let admin = Principal::new("admin", Role::Admin);
        let member = Principal::new("member", Role::Member);
        let outsider = Principal::new("outsider", Role::Member);
        let room = Room::new("eng", None, admin.id, [admin.id, member.id]).unwrap();
        let room = store.insert_room(room).await.unwrap();
        Fixture { store, admin, member, outsider, room }
    }

    fn titled(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_list_in_order() {
        let f = fixture().await;
        let now = Utc::now();

        let mut later = titled("later");
        later.deadline = Some(now + Duration::days(2));
        let mut sooner = titled("sooner");
        sooner.deadline = Some(now + Duration::days(1));

        create_task(&f.store, &f.member, f.room.id, later).await.unwrap();
        create_task(&f.store, &f.member, f.room.id, titled("undated")).await.unwrap();
        create_task(&f.store, &f.member, f.room.id, sooner).await.unwrap();

        let titles: Vec<String> = list_tasks(&f.store, &f.member, f.room.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["undated", "sooner", "later"]);
    }

    #[tokio::test]
    async fn test_outsider_cannot_touch_tasks() {
        let f = fixture().await;
        let err = create_task(&f.store, &f.outsider, f.room.id, titled("x")).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err = list_tasks(&f.store, &f.outsider, f.room.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_completing_sets_completed_at() {
        let f = fixture().await;
        let task = create_task(&f.store, &f.member, f.room.id, titled("ship")).await.unwrap();
        let updated = update_task(
            &f.store,
            &f.member,
            task.id,
            UpdateTaskRequest {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert!(updated.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_update_missing_task_is_404() {
        let f = fixture().await;
        let err = update_task(&f.store, &f.member, TaskId::new(), UpdateTaskRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_convert_uses_message_text() {
        let f = fixture().await;
        let text = "x".repeat(150);
        let message = ChatMessage::new(f.member.id, MessageTarget::Room(f.room.id), &text).unwrap();
        let message = f.store.insert_message(message).await.unwrap();

        let task = convert_message_to_task(
            &f.store,
            &f.member,
            ConvertMessageRequest {
                room_id: f.room.id,
                message_id: Some(message.id),
                title: None,
                deadline: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(task.title.chars().count(), 100);
        assert_eq!(task.source_message_id, Some(message.id));
    }

    #[tokio::test]
    async fn test_convert_without_message_uses_default_title() {
        let f = fixture().await;
        let task = convert_message_to_task(
            &f.store,
            &f.member,
            ConvertMessageRequest {
                room_id: f.room.id,
                message_id: None,
                title: Some("   ".into()),
                deadline: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(task.title, "New task");
    }

    #[tokio::test]
    async fn test_convert_rejects_message_from_other_room() {
        let f = fixture().await;
        let other = f
            .store
            .insert_room(Room::new("ops", None, f.admin.id, [f.admin.id, f.member.id]).unwrap())
            .await
            .unwrap();
        let message = ChatMessage::new(f.member.id, MessageTarget::Room(other.id), "secret").unwrap();
        let message = f.store.insert_message(message).await.unwrap();

        let err = convert_message_to_task(
            &f.store,
            &f.member,
            ConvertMessageRequest {
                room_id: f.room.id,
                message_id: Some(message.id),
                title: None,
                deadline: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_requires_creator_or_admin() {
        let f = fixture().await;
        let task = create_task(&f.store, &f.admin, f.room.id, titled("admin's")).await.unwrap();

        let err = delete_task(&f.store, &f.member, task.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        let own = create_task(&f.store, &f.member, f.room.id, titled("mine")).await.unwrap();
        delete_task(&f.store, &f.member, own.id).await.unwrap();
        delete_task(&f.store, &f.admin, task.id).await.unwrap();
        assert!(f.store.find_task(task.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_requires_room_access() {
        let f = fixture().await;
        let task = create_task(&f.store, &f.member, f.room.id, titled("x")).await.unwrap();
        let err = delete_task(&f.store, &f.outsider, task.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
