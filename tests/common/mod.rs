//! Common test utilities and helpers
//!
//! - `World`: a realtime hub over a fresh `MemoryStore`
//! - `TestClient`: a session plus the receiving end of its outbound queue
//! - Fixture builders for principals and rooms
//! - `TestApp`: the HTTP router behind an `axum_test::TestServer`

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use tokio::sync::mpsc;

use huddle::backend::auth::create_token;
use huddle::backend::realtime::{RealtimeHub, Session};
use huddle::backend::routes::create_router;
use huddle::backend::server::AppState;
use huddle::backend::store::{MemoryStore, Store};
use huddle::shared::config::RealtimeSettings;
use huddle::shared::event::SetupPayload;
use huddle::shared::messaging::{Principal, Role, Room};
use huddle::shared::{AppConfig, ChannelKey, ClientEvent, EventType, RealtimeEvent};

pub const TEST_SECRET: &str = "integration-test-secret";

/// Store plus hub, the way the server wires them
pub struct World {
    pub store: Arc<MemoryStore>,
    pub hub: RealtimeHub,
}

impl World {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let hub = RealtimeHub::new(store.clone(), RealtimeSettings::default());
        Self { store, hub }
    }

    pub async fn principal(&self, name: &str, role: Role) -> Principal {
        self.store
            .insert_principal(Principal::new(name, role))
            .await
            .unwrap()
            .principal
    }

    pub async fn room(&self, name: &str, creator: &Principal, participants: &[&Principal]) -> Room {
        let room = Room::new(name, None, creator.id, participants.iter().map(|p| p.id)).unwrap();
        self.store.insert_room(room).await.unwrap()
    }

    /// Open a session and complete `setup` for `principal`
    pub async fn connect(&self, principal: &Principal) -> TestClient {
        let mut client = TestClient::open(&self.hub);
        client.setup(principal).await;
        let ack = client.drain();
        assert_eq!(event_types(&ack), vec![EventType::Connected], "setup should ack");
        client
    }
}

/// One connection driven in-process
pub struct TestClient {
    pub session: Session,
    rx: mpsc::Receiver<RealtimeEvent>,
}

impl TestClient {
    pub fn open(hub: &RealtimeHub) -> Self {
        let (tx, rx) = hub.outbound_channel();
        Self {
            session: Session::open(hub, tx, None),
            rx,
        }
    }

    pub async fn send(&mut self, event: ClientEvent) {
        self.session.handle(event).await;
    }

    pub async fn setup(&mut self, principal: &Principal) {
        self.send(ClientEvent::Setup(SetupPayload {
            id: Some(principal.id.to_string()),
        }))
        .await;
    }

    pub async fn join(&mut self, channel: ChannelKey) {
        self.send(ClientEvent::JoinChannel(channel)).await;
    }

    /// Everything queued for this connection so far
    pub fn drain(&mut self) -> Vec<RealtimeEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    pub fn drain_types(&mut self) -> Vec<EventType> {
        event_types(&self.drain())
    }

    pub async fn close(&mut self) {
        self.session.close().await;
    }
}

pub fn event_types(events: &[RealtimeEvent]) -> Vec<EventType> {
    events.iter().map(|e| e.event_type).collect()
}

/// The full HTTP stack over a `MemoryStore`
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let config = AppConfig::builder().jwt_secret(TEST_SECRET).build().unwrap();
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        let server = TestServer::new(create_router(state.clone())).unwrap();
        Self { server, state }
    }

    /// Persist a principal and issue a token for it
    pub async fn principal(&self, name: &str, role: Role) -> (Principal, String) {
        let principal = self
            .state
            .store
            .insert_principal(Principal::new(name, role))
            .await
            .unwrap()
            .principal;
        let token = create_token(&principal, TEST_SECRET, 3600).unwrap();
        (principal, token)
    }
}
