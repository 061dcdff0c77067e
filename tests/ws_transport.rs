//! WebSocket transport tests
//!
//! The router is served on a real loopback listener and driven with a
//! `tokio-tungstenite` client, so the upgrade handler, the frame reader and
//! the heartbeat all run exactly as in production.

#![cfg(feature = "ssr")]

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use common::TEST_SECRET;
use huddle::backend::auth::create_token;
use huddle::backend::routes::create_router;
use huddle::backend::server::AppState;
use huddle::backend::store::{MemoryStore, Store};
use huddle::shared::event::SetupPayload;
use huddle::shared::messaging::{Principal, Role};
use huddle::shared::{AppConfig, ClientEvent, EventType, RealtimeEvent};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Served {
    addr: SocketAddr,
    state: AppState,
}

impl Served {
    async fn start(config: AppConfig) -> Self {
        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        let app = create_router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    fn url(&self, token: Option<&str>) -> String {
        match token {
            Some(token) => format!("ws://{}/ws?token={}", self.addr, token),
            None => format!("ws://{}/ws", self.addr),
        }
    }

    async fn principal(&self, name: &str) -> (Principal, String) {
        let principal = self
            .state
            .store
            .insert_principal(Principal::new(name, Role::Member))
            .await
            .unwrap()
            .principal;
        let token = create_token(&principal, TEST_SECRET, 3600).unwrap();
        (principal, token)
    }

    async fn connection_count_reaches(&self, expected: usize, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.state.realtime.registry().connection_count() == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        false
    }
}

fn config() -> huddle::shared::AppConfigBuilder {
    AppConfig::builder().jwt_secret(TEST_SECRET).heartbeat(1, 2)
}

async fn send(ws: &mut Client, event: &ClientEvent) {
    let text = serde_json::to_string(event).unwrap();
    ws.send(Message::Text(text.into())).await.unwrap();
}

fn setup(principal: &Principal) -> ClientEvent {
    ClientEvent::Setup(SetupPayload {
        id: Some(principal.id.to_string()),
    })
}

/// Next application event, skipping transport pings
async fn next_event(ws: &mut Client) -> RealtimeEvent {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("no frame within 5s")
            .expect("socket ended")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

fn rejected_status(result: Result<(Client, impl Sized), WsError>) -> u16 {
    match result {
        Err(WsError::Http(response)) => response.status().as_u16(),
        Err(other) => panic!("expected an HTTP rejection, got {}", other),
        Ok(_) => panic!("upgrade unexpectedly succeeded"),
    }
}

#[tokio::test]
async fn invalid_token_is_rejected_before_upgrade() {
    let served = Served::start(config().build().unwrap()).await;

    let status = rejected_status(connect_async(served.url(Some("not-a-jwt"))).await);
    assert_eq!(status, 401);
    assert_eq!(served.state.realtime.registry().connection_count(), 0);
}

#[tokio::test]
async fn required_token_rejects_anonymous_upgrade() {
    let served = Served::start(config().require_token(true).build().unwrap()).await;

    let status = rejected_status(connect_async(served.url(None)).await);
    assert_eq!(status, 401);

    let (_, token) = served.principal("bob").await;
    let (mut ws, _) = connect_async(served.url(Some(&token))).await.unwrap();
    send(&mut ws, &ClientEvent::Ping).await;
    assert_eq!(next_event(&mut ws).await.event_type, EventType::Pong);
}

#[tokio::test]
async fn verified_token_pins_the_setup_identity() {
    let served = Served::start(config().build().unwrap()).await;
    let (bob, token) = served.principal("bob").await;
    let (carol, _) = served.principal("carol").await;

    let (mut ws, _) = connect_async(served.url(Some(&token))).await.unwrap();

    send(&mut ws, &setup(&carol)).await;
    let rejected = next_event(&mut ws).await;
    assert_eq!(rejected.event_type, EventType::SetupError);
    assert!(!served.state.realtime.registry().is_online(carol.id));

    send(&mut ws, &setup(&bob)).await;
    let accepted = next_event(&mut ws).await;
    assert_eq!(accepted.event_type, EventType::Connected);
    assert!(served.state.realtime.registry().is_online(bob.id));
}

#[tokio::test]
async fn malformed_frame_is_dropped_without_closing() {
    let served = Served::start(config().build().unwrap()).await;
    let (mut ws, _) = connect_async(served.url(None)).await.unwrap();

    ws.send(Message::Text("{not json".to_string().into())).await.unwrap();
    ws.send(Message::Text(r#"{"event":"no_such_event"}"#.to_string().into()))
        .await
        .unwrap();
    send(&mut ws, &ClientEvent::Ping).await;

    assert_eq!(next_event(&mut ws).await.event_type, EventType::Pong);
}

#[tokio::test]
async fn silent_connection_times_out_and_is_cleaned_up() {
    let served = Served::start(config().build().unwrap()).await;
    let (bob, token) = served.principal("bob").await;

    let (mut ws, _) = connect_async(served.url(Some(&token))).await.unwrap();
    send(&mut ws, &setup(&bob)).await;
    assert_eq!(next_event(&mut ws).await.event_type, EventType::Connected);
    assert!(served.connection_count_reaches(1, Duration::from_secs(1)).await);

    // No reads from here on, so transport pings go unanswered
    assert!(
        served.connection_count_reaches(0, Duration::from_secs(6)).await,
        "connection should be dropped after the heartbeat timeout"
    );
    assert!(!served.state.realtime.registry().is_online(bob.id));
    let record = served.state.store.find_principal(bob.id).await.unwrap().unwrap();
    assert!(!record.is_online);
    drop(ws);
}
