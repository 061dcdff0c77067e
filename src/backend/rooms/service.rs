//! Room operations
//!
//! Each function takes the acting principal and returns `BackendError`s that
//! map straight onto HTTP statuses. Existence is always checked before
//! permission, so a missing room is a 404 even for callers who could never
//! have entered it.

use std::collections::BTreeSet;

use crate::backend::access::{can_access, can_manage_rooms};
use crate::backend::error::BackendError;
use crate::backend::realtime::{DenyReason, RealtimeHub};
use crate::backend::store::{CascadeSummary, Store};
use crate::shared::channel::ChannelKey;
use crate::shared::ids::{PrincipalId, RoomId};
use crate::shared::messaging::{
    ChatMessage, CreateRoomRequest, ParticipantPresence, Principal, Room, RoomStatus, RoomView,
    UpdateParticipantsRequest,
};
use crate::shared::RealtimeEvent;

/// Load a room or fail with 404
pub async fn find_room_or_404(store: &dyn Store, room_id: RoomId) -> Result<Room, BackendError> {
    store
        .find_room(room_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Room not found"))
}

/// Load a room the principal may enter: 404 when missing, then 403
pub async fn accessible_room(
    store: &dyn Store,
    principal: &Principal,
    room_id: RoomId,
) -> Result<Room, BackendError> {
    let room = find_room_or_404(store, room_id).await?;
    if !can_access(Some(principal), Some(&room)) {
        return Err(BackendError::forbidden("Access restricted to room participants"));
    }
    Ok(room)
}

/// Load a room an ADMIN is about to change: 404 when missing, then 403
async fn managed_room(
    store: &dyn Store,
    principal: &Principal,
    room_id: RoomId,
    action: &str,
) -> Result<Room, BackendError> {
    let room = find_room_or_404(store, room_id).await?;
    if !can_manage_rooms(principal) {
        tracing::info!("[Room] {} forbidden for {} (not ADMIN)", action, principal.id);
        return Err(BackendError::forbidden(format!("Only admins can {} rooms", action)));
    }
    Ok(room)
}

/// Create a room. The creator is always a participant.
pub async fn create_room(
    store: &dyn Store,
    principal: &Principal,
    request: CreateRoomRequest,
) -> Result<Room, BackendError> {
    if !can_manage_rooms(principal) {
        return Err(BackendError::forbidden("Only admins can create rooms"));
    }

    let mut participants: BTreeSet<PrincipalId> = request.participants.into_iter().collect();
    participants.insert(principal.id);

    let room = Room::new(
        &request.name,
        request.description.as_deref(),
        principal.id,
        participants,
    )?;
    let room = store.insert_room(room).await?;
    tracing::info!("[Room] Created {} ({}) by {}", room.name, room.id, principal.id);
    Ok(room)
}

/// Every room, newest-updated first, annotated with whether `principal` may enter
pub async fn list_rooms(store: &dyn Store, principal: &Principal) -> Result<Vec<RoomView>, BackendError> {
    let rooms = store.list_rooms().await?;
    Ok(rooms
        .into_iter()
        .map(|room| {
            let has_access = can_access(Some(principal), Some(&room));
            RoomView { room, has_access }
        })
        .collect())
}

/// Enter a room. Access is never granted as a side effect; the caller must
/// already be a participant or an ADMIN.
pub async fn enter_room(
    store: &dyn Store,
    principal: &Principal,
    room_id: RoomId,
) -> Result<Room, BackendError> {
    let room = find_room_or_404(store, room_id).await?;
    if !can_access(Some(principal), Some(&room)) {
        return Err(BackendError::forbidden(
            "Access restricted. You must be assigned to this room.",
        ));
    }
    tracing::debug!("[Room] {} entered {}", principal.id, room.id);
    Ok(room)
}

/// Room history, oldest first
pub async fn room_messages(
    store: &dyn Store,
    principal: &Principal,
    room_id: RoomId,
) -> Result<Vec<ChatMessage>, BackendError> {
    let room = accessible_room(store, principal, room_id).await?;
    Ok(store.messages_for_room(room.id).await?)
}

/// Replace a room's participant set
///
/// Connections of principals who lose access leave the room channel at once
/// and are sent `join_channel_error`, instead of waiting for their next
/// publish to be re-checked.
pub async fn update_participants(
    store: &dyn Store,
    hub: &RealtimeHub,
    principal: &Principal,
    room_id: RoomId,
    request: UpdateParticipantsRequest,
) -> Result<Room, BackendError> {
    let room = managed_room(store, principal, room_id, "modify participants of").await?;

    let participants: BTreeSet<PrincipalId> = request.participant_ids.into_iter().collect();
    let removed: Vec<PrincipalId> = room.participants.difference(&participants).copied().collect();

    let updated = store.update_room_participants(room.id, participants).await?;
    tracing::info!(
        "[Room] Participants of {} set to {} ({} removed)",
        updated.id,
        updated.participants.len(),
        removed.len()
    );

    revoke_room_channel(store, hub, &updated, &removed).await;
    Ok(updated)
}

async fn revoke_room_channel(store: &dyn Store, hub: &RealtimeHub, room: &Room, removed: &[PrincipalId]) {
    let channel = ChannelKey::room(room.id);
    for &principal_id in removed {
        let still_allowed = match store.find_principal(principal_id).await {
            Ok(Some(record)) => can_access(Some(&record.principal), Some(room)),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!("[Room] Could not look up removed participant {}: {}", principal_id, e);
                continue;
            }
        };
        if still_allowed {
            continue;
        }
        for connection_id in hub.registry().connections_of(principal_id) {
            let Some(connection) = hub.registry().connection(connection_id) else {
                continue;
            };
            if connection.leave(&channel) {
                tracing::debug!("[Room] Connection {} left {} after removal", connection_id, channel);
                hub.relay().send_to(
                    connection_id,
                    RealtimeEvent::join_channel_error(channel, DenyReason::AccessRestricted.as_str()),
                );
            }
        }
    }
}

/// Archive a room: status `Archived`, no longer active
pub async fn archive_room(
    store: &dyn Store,
    principal: &Principal,
    room_id: RoomId,
) -> Result<Room, BackendError> {
    let room = managed_room(store, principal, room_id, "archive").await?;
    let archived = store
        .update_room_status(room.id, RoomStatus::Archived, false)
        .await?;
    tracing::info!("[Room] Archived {} ({})", archived.name, archived.id);
    Ok(archived)
}

/// Delete a room with its messages and tasks, then tell every connection
///
/// The room channel is purged from every joined set before `room_deleted`
/// goes out, so no relay can target the dead channel afterwards.
pub async fn delete_room(
    store: &dyn Store,
    hub: &RealtimeHub,
    principal: &Principal,
    room_id: RoomId,
) -> Result<CascadeSummary, BackendError> {
    let room = managed_room(store, principal, room_id, "delete").await?;

    let summary = store.delete_room_cascade(room.id).await?;
    tracing::info!(
        "[Room] Deleted {} {} | messages: {} | tasks: {}",
        room.id,
        room.name,
        summary.messages,
        summary.tasks
    );

    let purged = hub.membership().purge_channel(&ChannelKey::room(room.id));
    let notified = hub
        .relay()
        .broadcast_all(RealtimeEvent::room_deleted(room.id), None);
    tracing::info!(
        "[Room] Emitted room_deleted to {} connections ({} left the channel)",
        notified,
        purged
    );

    Ok(summary)
}

/// Online state of each participant
pub async fn room_presence(
    store: &dyn Store,
    hub: &RealtimeHub,
    principal: &Principal,
    room_id: RoomId,
) -> Result<Vec<ParticipantPresence>, BackendError> {
    let room = accessible_room(store, principal, room_id).await?;
    Ok(store
        .room_participants(room.id)
        .await?
        .into_iter()
        .map(|principal_id| ParticipantPresence {
            principal_id,
            online: hub.presence().is_online(principal_id),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::store::MemoryStore;
    use crate::shared::config::RealtimeSettings;
    use crate::shared::messaging::Role;
    use assert_matches::assert_matches;
    use axum::http::StatusCode;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        hub: RealtimeHub,
        admin: Principal,
        member: Principal,
        outsider: Principal,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let hub = RealtimeHub::new(store.clone(), RealtimeSettings::default());
        let admin = store.insert_principal(Principal::new("admin", Role::Admin)).await.unwrap().principal;
        let member = store.insert_principal(Principal::new("member", Role::Member)).await.unwrap().principal;
        let outsider = store.insert_principal(Principal::new("outsider", Role::Member)).await.unwrap().principal;
        Fixture { store, hub, admin, member, outsider }
    }

    async fn room_with_member(f: &Fixture) -> Room {
        create_room(
            &*f.store,
            &f.admin,
            CreateRoomRequest {
                name: "eng".into(),
                description: None,
                participants: vec![f.member.id],
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_room_adds_creator() {
        let f = fixture().await;
        let room = room_with_member(&f).await;
        assert!(room.is_participant(f.admin.id));
        assert!(room.is_participant(f.member.id));
        assert_eq!(room.status, RoomStatus::Active);
    }

    #[tokio::test]
    async fn test_members_cannot_create_rooms() {
        let f = fixture().await;
        let err = create_room(&*f.store, &f.member, CreateRoomRequest {
            name: "eng".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_create_room_requires_name() {
        let f = fixture().await;
        let err = create_room(&*f.store, &f.admin, CreateRoomRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_rooms_annotates_access() {
        let f = fixture().await;
        room_with_member(&f).await;

        let views = list_rooms(&*f.store, &f.outsider).await.unwrap();
        assert_eq!(views.len(), 1);
        assert!(!views[0].has_access);

        let views = list_rooms(&*f.store, &f.member).await.unwrap();
        assert!(views[0].has_access);
    }

    #[tokio::test]
    async fn test_enter_room_not_found_before_forbidden() {
        let f = fixture().await;
        let err = enter_room(&*f.store, &f.outsider, RoomId::new()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let room = room_with_member(&f).await;
        let err = enter_room(&*f.store, &f.outsider, room.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        // Entering never grants access
        let again = f.store.find_room(room.id).await.unwrap().unwrap();
        assert!(!again.is_participant(f.outsider.id));
    }

    #[tokio::test]
    async fn test_archive_room() {
        let f = fixture().await;
        let room = room_with_member(&f).await;
        assert_matches!(
            archive_room(&*f.store, &f.member, room.id).await,
            Err(BackendError::Forbidden { .. })
        );
        let archived = archive_room(&*f.store, &f.admin, room.id).await.unwrap();
        assert_eq!(archived.status, RoomStatus::Archived);
        assert!(!archived.is_active);
    }

    #[tokio::test]
    async fn test_update_participants_revokes_channel() {
        let f = fixture().await;
        let room = room_with_member(&f).await;

        let (tx, mut rx) = f.hub.outbound_channel();
        let connection = Arc::new(crate::backend::realtime::Connection::new(tx));
        f.hub.registry().attach(Arc::clone(&connection));
        f.hub.presence().connect(&connection, f.member.id).await;
        connection.join(ChannelKey::room(room.id));

        let updated = update_participants(
            &*f.store,
            &f.hub,
            &f.admin,
            room.id,
            UpdateParticipantsRequest { participant_ids: vec![f.admin.id] },
        )
        .await
        .unwrap();

        assert!(!updated.is_participant(f.member.id));
        assert!(!connection.is_joined(&ChannelKey::room(room.id)));
        let notice = rx.try_recv().unwrap();
        assert_eq!(notice.event_type, crate::shared::EventType::JoinChannelError);
        assert_eq!(notice.payload["reason"], "access_restricted");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_room_missing_is_404_for_everyone() {
        let f = fixture().await;
        let err = delete_room(&*f.store, &f.hub, &f.member, RoomId::new()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_room_member_forbidden() {
        let f = fixture().await;
        let room = room_with_member(&f).await;
        let err = delete_room(&*f.store, &f.hub, &f.member, room.id).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(f.store.find_room(room.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_room_presence() {
        let f = fixture().await;
        let room = room_with_member(&f).await;

        let (tx, _rx) = f.hub.outbound_channel();
        let connection = Arc::new(crate::backend::realtime::Connection::new(tx));
        f.hub.registry().attach(Arc::clone(&connection));
        f.hub.presence().connect(&connection, f.member.id).await;

        let presence = room_presence(&*f.store, &f.hub, &f.admin, room.id).await.unwrap();
        let member = presence.iter().find(|p| p.principal_id == f.member.id).unwrap();
        let admin = presence.iter().find(|p| p.principal_id == f.admin.id).unwrap();
        assert!(member.online);
        assert!(!admin.online);
    }
}
