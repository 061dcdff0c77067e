/**
 * WebSocket Transport
 *
 * `GET /ws` upgrades to a WebSocket and hands the socket to a `Session`.
 *
 * # Authentication
 *
 * A bearer token may be supplied as `?token=` or in the `Authorization`
 * header. A token that fails verification rejects the upgrade with 401. A
 * verified token pins the identity that `setup` must name. Without a token
 * the upgrade is refused only when `auth.require_token` is set.
 *
 * # Tasks
 *
 * Each socket runs two tasks:
 * - the reader (this handler), which parses client frames and feeds them to
 *   the session one at a time
 * - the writer, which drains the connection's bounded outbound queue in
 *   order and sends a ping every heartbeat interval
 *
 * A connection that sends nothing for the heartbeat timeout is declared
 * dead. However the reader loop ends, the session is closed so registry and
 * presence cleanup always run.
 */

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

use super::hub::RealtimeHub;
use super::session::Session;
use crate::backend::auth::sessions::verify_token;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::bearer_token;
use crate::backend::server::state::AppState;
use crate::shared::ids::PrincipalId;
use crate::shared::{ClientEvent, RealtimeEvent};

const WRITER_DRAIN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Upgrade handler for `GET /ws`
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
) -> Result<Response, BackendError> {
    let token = params.token.or_else(|| bearer_token(&headers));

    let pinned = match token {
        Some(token) => {
            let claims = verify_token(&token, &state.config.auth.jwt_secret).map_err(|e| {
                tracing::warn!("[Realtime] Rejected WebSocket upgrade: {}", e);
                BackendError::unauthorized("Invalid or expired token")
            })?;
            let principal_id = claims
                .sub
                .parse::<PrincipalId>()
                .map_err(|_| BackendError::unauthorized("Invalid token subject"))?;
            Some(principal_id)
        }
        None if state.config.auth.require_token => {
            return Err(BackendError::unauthorized("Missing authentication token"));
        }
        None => None,
    };

    let hub = state.realtime.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, pinned)))
}

/// Run one WebSocket connection to completion
pub async fn handle_socket(socket: WebSocket, hub: RealtimeHub, pinned: Option<PrincipalId>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (outbound_tx, outbound_rx) = hub.outbound_channel();
    let mut session = Session::open(&hub, outbound_tx, pinned);
    let connection_id = session.id();

    tracing::info!("[Realtime] WebSocket connection {} opened", connection_id);

    let heartbeat_interval = hub.settings().heartbeat_interval();
    let writer = tokio::spawn(async move {
        run_writer(&mut ws_tx, outbound_rx, heartbeat_interval).await;
        let _ = ws_tx.close().await;
    });

    let heartbeat_timeout = hub.settings().heartbeat_timeout();
    loop {
        let frame = match tokio::time::timeout(heartbeat_timeout, ws_rx.next()).await {
            Ok(Some(Ok(frame))) => frame,
            Ok(Some(Err(e))) => {
                tracing::debug!("[Realtime] WebSocket error on {}: {}", connection_id, e);
                break;
            }
            Ok(None) => break,
            Err(_) => {
                tracing::info!(
                    "[Realtime] Connection {} timed out after {:?} of silence",
                    connection_id,
                    heartbeat_timeout
                );
                break;
            }
        };

        match frame {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => session.handle(event).await,
                Err(e) => {
                    tracing::warn!("[Realtime] Dropping malformed frame from {}: {}", connection_id, e);
                }
            },
            Message::Close(_) => break,
            // Pings are answered by the transport; any frame counts as liveness
            Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    session.close().await;
    // Last outbound sender; the writer drains the queue and exits
    drop(session);
    let abort = writer.abort_handle();
    if tokio::time::timeout(WRITER_DRAIN_GRACE, writer).await.is_err() {
        abort.abort();
    }
    tracing::info!("[Realtime] WebSocket connection {} closed", connection_id);
}

async fn run_writer<S>(
    ws_tx: &mut S,
    mut outbound_rx: mpsc::Receiver<RealtimeEvent>,
    heartbeat_interval: Duration,
) where
    S: futures_util::Sink<Message> + Unpin,
{
    let mut ticker = tokio::time::interval(heartbeat_interval);
    ticker.tick().await;

    loop {
        tokio::select! {
            maybe_event = outbound_rx.recv() => {
                let Some(event) = maybe_event else { break };
                let json = match serde_json::to_string(&event) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::warn!("[Realtime] Failed to serialize event: {}", e);
                        continue;
                    }
                };
                if ws_tx.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if ws_tx.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }
}
