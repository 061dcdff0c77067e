//! Task HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::service;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::ids::{RoomId, TaskId};
use crate::shared::messaging::{ConvertMessageRequest, CreateTaskRequest, Task, UpdateTaskRequest};

/// `POST /api/rooms/{id}/tasks`
pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), BackendError> {
    let task = service::create_task(state.store.as_ref(), &principal, room_id, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `GET /api/rooms/{id}/tasks`
pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Vec<Task>>, BackendError> {
    Ok(Json(
        service::list_tasks(state.store.as_ref(), &principal, room_id).await?,
    ))
}

/// `PATCH /api/tasks/{id}`
pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(task_id): Path<TaskId>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<Task>, BackendError> {
    Ok(Json(
        service::update_task(state.store.as_ref(), &principal, task_id, request).await?,
    ))
}

/// `POST /api/tasks/from-message`
pub async fn convert_message_to_task(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(request): Json<ConvertMessageRequest>,
) -> Result<(StatusCode, Json<Task>), BackendError> {
    let task = service::convert_message_to_task(state.store.as_ref(), &principal, request).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// `DELETE /api/tasks/{id}`
pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(task_id): Path<TaskId>,
) -> Result<StatusCode, BackendError> {
    service::delete_task(state.store.as_ref(), &principal, task_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
