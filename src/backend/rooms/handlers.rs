//! Room HTTP Handlers
//!
//! Thin Axum wrappers over `rooms::service`. Every handler requires an
//! authenticated principal.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::service;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;
use crate::shared::ids::RoomId;
use crate::shared::messaging::{
    ChatMessage, CreateRoomRequest, ParticipantPresence, Room, RoomView, UpdateParticipantsRequest,
};

/// `POST /api/rooms`
pub async fn create_room(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<Room>), BackendError> {
    let room = service::create_room(state.store.as_ref(), &principal, request).await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// `GET /api/rooms`
pub async fn list_rooms(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
) -> Result<Json<Vec<RoomView>>, BackendError> {
    Ok(Json(service::list_rooms(state.store.as_ref(), &principal).await?))
}

/// `GET /api/rooms/{id}`
pub async fn get_room(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Room>, BackendError> {
    Ok(Json(
        service::accessible_room(state.store.as_ref(), &principal, room_id).await?,
    ))
}

/// `POST /api/rooms/{id}/join`
pub async fn enter_room(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Room>, BackendError> {
    Ok(Json(
        service::enter_room(state.store.as_ref(), &principal, room_id).await?,
    ))
}

/// `GET /api/rooms/{id}/messages`
pub async fn room_messages(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Vec<ChatMessage>>, BackendError> {
    Ok(Json(
        service::room_messages(state.store.as_ref(), &principal, room_id).await?,
    ))
}

/// `PUT /api/rooms/{id}/participants`
pub async fn update_participants(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
    Json(request): Json<UpdateParticipantsRequest>,
) -> Result<Json<Room>, BackendError> {
    let room = service::update_participants(
        state.store.as_ref(),
        &state.realtime,
        &principal,
        room_id,
        request,
    )
    .await?;
    Ok(Json(room))
}

/// `PATCH /api/rooms/{id}/archive`
pub async fn archive_room(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Room>, BackendError> {
    Ok(Json(
        service::archive_room(state.store.as_ref(), &principal, room_id).await?,
    ))
}

/// `DELETE /api/rooms/{id}`
pub async fn delete_room(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
) -> Result<StatusCode, BackendError> {
    service::delete_room(state.store.as_ref(), &state.realtime, &principal, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/rooms/{id}/presence`
pub async fn room_presence(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Vec<ParticipantPresence>>, BackendError> {
    Ok(Json(
        service::room_presence(state.store.as_ref(), &state.realtime, &principal, room_id).await?,
    ))
}
