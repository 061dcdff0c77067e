//! HTTP API integration tests
//!
//! The full router runs behind `axum_test::TestServer` over a `MemoryStore`.

#![cfg(feature = "ssr")]

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{TestApp, TestClient};
use huddle::backend::store::Store;
use huddle::shared::messaging::{
    ChatMessage, ConversationView, FocusSession, MessageTarget, PrincipalRecord, Role, Room, RoomView,
    Task, TaskStatus,
};
use huddle::shared::{EventType, RoomId};

async fn create_room(app: &TestApp, token: &str, body: Value) -> Room {
    let response = app
        .server
        .post("/api/rooms")
        .authorization_bearer(token)
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Room>()
}

#[tokio::test]
async fn health_reports_connection_counts() {
    let app = TestApp::new();
    let response = app.server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body = response.json::<Value>();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["connections"], 0);
    assert_eq!(body["online"], 0);
}

#[tokio::test]
async fn api_requires_a_valid_token() {
    let app = TestApp::new();

    let response = app.server.get("/api/rooms").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = app
        .server
        .get("/api/rooms")
        .authorization_bearer("not-a-jwt")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["status"], 401);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = TestApp::new();
    let response = app.server.get("/api/nope").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_admins_create_rooms() {
    let app = TestApp::new();
    let (admin, admin_token) = app.principal("admin", Role::Admin).await;
    let (member, member_token) = app.principal("member", Role::Member).await;

    let response = app
        .server
        .post("/api/rooms")
        .authorization_bearer(&member_token)
        .json(&json!({ "name": "eng" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let room = create_room(
        &app,
        &admin_token,
        json!({ "name": "  eng  ", "participants": [member.id] }),
    )
    .await;
    assert_eq!(room.name, "eng");
    assert!(room.participants.contains(&admin.id));
    assert!(room.participants.contains(&member.id));
    assert_eq!(room.created_by, admin.id);
}

#[tokio::test]
async fn blank_room_name_is_rejected() {
    let app = TestApp::new();
    let (_, token) = app.principal("admin", Role::Admin).await;

    let response = app
        .server
        .post("/api/rooms")
        .authorization_bearer(&token)
        .json(&json!({ "name": "   " }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn room_list_marks_access() {
    let app = TestApp::new();
    let (_, admin_token) = app.principal("admin", Role::Admin).await;
    let (member, member_token) = app.principal("member", Role::Member).await;

    let open = create_room(&app, &admin_token, json!({ "name": "open", "participants": [member.id] })).await;
    let closed = create_room(&app, &admin_token, json!({ "name": "closed" })).await;

    let views = app
        .server
        .get("/api/rooms")
        .authorization_bearer(&member_token)
        .await
        .json::<Vec<RoomView>>();
    assert_eq!(views.len(), 2);
    for view in views {
        assert_eq!(view.has_access, view.room.id == open.id, "room {}", view.room.name);
    }

    let response = app
        .server
        .get(&format!("/api/rooms/{}", closed.id))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .post(&format!("/api/rooms/{}/join", open.id))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn missing_room_is_404_before_permission() {
    let app = TestApp::new();
    let (_, member_token) = app.principal("member", Role::Member).await;
    let missing = RoomId::new();

    for path in [
        format!("/api/rooms/{}", missing),
        format!("/api/rooms/{}/messages", missing),
        format!("/api/rooms/{}/tasks", missing),
    ] {
        let response = app.server.get(&path).authorization_bearer(&member_token).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "GET {}", path);
    }

    let response = app
        .server
        .delete(&format!("/api/rooms/{}", missing))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn members_cannot_manage_rooms() {
    let app = TestApp::new();
    let (_, admin_token) = app.principal("admin", Role::Admin).await;
    let (member, member_token) = app.principal("member", Role::Member).await;
    let room = create_room(&app, &admin_token, json!({ "name": "r", "participants": [member.id] })).await;

    let response = app
        .server
        .delete(&format!("/api/rooms/{}", room.id))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .patch(&format!("/api/rooms/{}/archive", room.id))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .put(&format!("/api/rooms/{}/participants", room.id))
        .authorization_bearer(&member_token)
        .json(&json!({ "participant_ids": [] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deleting_a_room_cascades_and_announces() {
    let app = TestApp::new();
    let (admin, admin_token) = app.principal("admin", Role::Admin).await;
    let (member, member_token) = app.principal("member", Role::Member).await;
    let room = create_room(&app, &admin_token, json!({ "name": "r", "participants": [member.id] })).await;

    let response = app
        .server
        .post("/api/chat/messages")
        .authorization_bearer(&member_token)
        .json(&json!({ "content": "hello", "room_id": room.id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let response = app
        .server
        .post(&format!("/api/rooms/{}/tasks", room.id))
        .authorization_bearer(&member_token)
        .json(&json!({ "title": "follow up" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);

    let mut watcher = TestClient::open(&app.state.realtime);
    watcher.setup(&admin).await;
    watcher.drain();

    let response = app
        .server
        .delete(&format!("/api/rooms/{}", room.id))
        .authorization_bearer(&admin_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);

    let events = watcher.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, EventType::RoomDeleted);
    assert_eq!(events[0].payload["room_id"], json!(room.id));

    assert!(app.state.store.find_room(room.id).await.unwrap().is_none());
    assert!(app.state.store.messages_for_room(room.id).await.unwrap().is_empty());
    assert!(app.state.store.tasks_for_room(room.id).await.unwrap().is_empty());

    let response = app
        .server
        .get(&format!("/api/rooms/{}", room.id))
        .authorization_bearer(&admin_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn message_target_must_be_exactly_one() {
    let app = TestApp::new();
    let (_, token) = app.principal("member", Role::Member).await;

    for body in [
        json!({ "content": "hi" }),
        json!({
            "content": "hi",
            "room_id": RoomId::new(),
            "conversation_id": uuid::Uuid::new_v4(),
        }),
        json!({ "content": "   ", "conversation_id": uuid::Uuid::new_v4() }),
    ] {
        let response = app
            .server
            .post("/api/chat/messages")
            .authorization_bearer(&token)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{}", body);
    }
}

#[tokio::test]
async fn conversation_messages_round_trip() {
    let app = TestApp::new();
    let (alice, token) = app.principal("alice", Role::Member).await;
    let (bob, bob_token) = app.principal("bob", Role::Member).await;
    let (_, carol_token) = app.principal("carol", Role::Member).await;

    let response = app
        .server
        .post("/api/chat/conversations")
        .authorization_bearer(&token)
        .json(&json!({ "user_id": bob.id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let conversation = response.json::<ConversationView>();

    let again = app
        .server
        .post("/api/chat/conversations")
        .authorization_bearer(&bob_token)
        .json(&json!({ "user_id": alice.id }))
        .await;
    assert_eq!(again.status_code(), StatusCode::OK);
    assert_eq!(again.json::<ConversationView>().id, conversation.id);

    for text in ["first", "second"] {
        let response = app
            .server
            .post("/api/chat/messages")
            .authorization_bearer(&token)
            .json(&json!({ "content": text, "conversation_id": conversation.id }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);
    }

    let messages = app
        .server
        .get(&format!("/api/chat/messages/{}", conversation.id))
        .authorization_bearer(&bob_token)
        .await
        .json::<Vec<ChatMessage>>();
    let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert!(messages.iter().all(|m| m.sender == alice.id));
    assert!(matches!(messages[0].target, MessageTarget::Conversation(_)));

    let outsider = app
        .server
        .get(&format!("/api/chat/messages/{}", conversation.id))
        .authorization_bearer(&carol_token)
        .await;
    assert_eq!(outsider.status_code(), StatusCode::FORBIDDEN);

    let listed = app
        .server
        .get("/api/chat/conversations")
        .authorization_bearer(&bob_token)
        .await
        .json::<Vec<ConversationView>>();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].last_message.as_ref().map(|m| m.text.as_str()), Some("second"));
}

#[tokio::test]
async fn opening_a_conversation_validates_the_other_user() {
    let app = TestApp::new();
    let (alice, token) = app.principal("alice", Role::Member).await;

    for (body, status) in [
        (json!({}), StatusCode::BAD_REQUEST),
        (json!({ "user_id": alice.id }), StatusCode::BAD_REQUEST),
        (json!({ "user_id": uuid::Uuid::new_v4() }), StatusCode::NOT_FOUND),
    ] {
        let response = app
            .server
            .post("/api/chat/conversations")
            .authorization_bearer(&token)
            .json(&body)
            .await;
        assert_eq!(response.status_code(), status, "{}", body);
    }

    let response = app
        .server
        .get(&format!("/api/chat/messages/{}", uuid::Uuid::new_v4()))
        .authorization_bearer(&token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_search_and_member_directory() {
    let app = TestApp::new();
    let (_, token) = app.principal("Dana", Role::Admin).await;
    app.principal("danielle", Role::Member).await;
    app.principal("erin", Role::Member).await;

    let found = app
        .server
        .get("/api/chat/users")
        .add_query_param("search", "DAN")
        .authorization_bearer(&token)
        .await
        .json::<Vec<PrincipalRecord>>();
    let names: Vec<_> = found.iter().map(|r| r.principal.display_name.as_str()).collect();
    assert_eq!(names, vec!["danielle"]);

    let members = app
        .server
        .get("/api/chat/members")
        .authorization_bearer(&token)
        .await
        .json::<Vec<PrincipalRecord>>();
    let names: Vec<_> = members.iter().map(|r| r.principal.display_name.as_str()).collect();
    assert_eq!(names, vec!["danielle", "erin"]);
}

#[tokio::test]
async fn focus_sessions_start_stop_and_report() {
    let app = TestApp::new();
    let (_, token) = app.principal("alice", Role::Member).await;

    let stopped = app
        .server
        .post("/api/focus/stop")
        .authorization_bearer(&token)
        .await;
    assert_eq!(stopped.status_code(), StatusCode::OK);
    assert_eq!(stopped.json::<Value>(), Value::Null);

    let started = app
        .server
        .post("/api/focus/start")
        .authorization_bearer(&token)
        .await;
    assert_eq!(started.status_code(), StatusCode::CREATED);
    let started = started.json::<FocusSession>();
    assert!(started.is_active);

    let stopped = app
        .server
        .post("/api/focus/stop")
        .authorization_bearer(&token)
        .await
        .json::<Option<FocusSession>>()
        .unwrap();
    assert_eq!(stopped.id, started.id);
    assert!(!stopped.is_active);

    let stats = app
        .server
        .get("/api/focus/stats")
        .authorization_bearer(&token)
        .await
        .json::<Vec<FocusSession>>();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].id, started.id);
}

#[tokio::test]
async fn outsiders_cannot_post_to_a_room() {
    let app = TestApp::new();
    let (_, admin_token) = app.principal("admin", Role::Admin).await;
    let (_, outsider_token) = app.principal("outsider", Role::Member).await;
    let room = create_room(&app, &admin_token, json!({ "name": "r" })).await;

    let response = app
        .server
        .post("/api/chat/messages")
        .authorization_bearer(&outsider_token)
        .json(&json!({ "content": "let me in", "room_id": room.id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    assert!(app.state.store.messages_for_room(room.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn message_becomes_task() {
    let app = TestApp::new();
    let (_, admin_token) = app.principal("admin", Role::Admin).await;
    let (member, member_token) = app.principal("member", Role::Member).await;
    let room = create_room(&app, &admin_token, json!({ "name": "r", "participants": [member.id] })).await;

    let message = app
        .server
        .post("/api/chat/messages")
        .authorization_bearer(&member_token)
        .json(&json!({ "content": "Fix the login page", "room_id": room.id }))
        .await
        .json::<ChatMessage>();

    let response = app
        .server
        .post("/api/tasks/from-message")
        .authorization_bearer(&member_token)
        .json(&json!({ "room_id": room.id, "message_id": message.id }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let task = response.json::<Task>();
    assert_eq!(task.title, "Fix the login page");
    assert_eq!(task.source_message_id, Some(message.id));
    assert_eq!(task.created_by, member.id);

    let response = app
        .server
        .patch(&format!("/api/tasks/{}", task.id))
        .authorization_bearer(&member_token)
        .json(&json!({ "status": "Completed" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Task>();
    assert_eq!(updated.status, TaskStatus::Completed);
    assert!(updated.completed_at.is_some());

    let tasks = app
        .server
        .get(&format!("/api/rooms/{}/tasks", room.id))
        .authorization_bearer(&member_token)
        .await
        .json::<Vec<Task>>();
    assert_eq!(tasks.len(), 1);
}

#[tokio::test]
async fn only_creator_or_admin_deletes_task() {
    let app = TestApp::new();
    let (_, admin_token) = app.principal("admin", Role::Admin).await;
    let (alice, alice_token) = app.principal("alice", Role::Member).await;
    let (bob, bob_token) = app.principal("bob", Role::Member).await;
    let room = create_room(
        &app,
        &admin_token,
        json!({ "name": "r", "participants": [alice.id, bob.id] }),
    )
    .await;

    let task = app
        .server
        .post(&format!("/api/rooms/{}/tasks", room.id))
        .authorization_bearer(&alice_token)
        .json(&json!({ "title": "alice's task" }))
        .await
        .json::<Task>();

    let response = app
        .server
        .delete(&format!("/api/tasks/{}", task.id))
        .authorization_bearer(&bob_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);

    let response = app
        .server
        .delete(&format!("/api/tasks/{}", task.id))
        .authorization_bearer(&admin_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::NO_CONTENT);
    assert!(app.state.store.find_task(task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn removed_participant_loses_access() {
    let app = TestApp::new();
    let (_, admin_token) = app.principal("admin", Role::Admin).await;
    let (member, member_token) = app.principal("member", Role::Member).await;
    let room = create_room(&app, &admin_token, json!({ "name": "r", "participants": [member.id] })).await;

    let response = app
        .server
        .put(&format!("/api/rooms/{}/participants", room.id))
        .authorization_bearer(&admin_token)
        .json(&json!({ "participant_ids": [] }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let response = app
        .server
        .get(&format!("/api/rooms/{}/messages", room.id))
        .authorization_bearer(&member_token)
        .await;
    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}
