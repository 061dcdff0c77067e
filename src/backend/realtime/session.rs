/**
 * Session Bootstrap
 *
 * Drives one connection through its lifecycle:
 *
 * ```text
 * Unauthenticated --setup--> Identified --join_channel--> Joined
 *        \                        \                         /
 *         +------------------------+---- disconnect ----> Closed
 * ```
 *
 * # Setup
 *
 * `setup` names the principal. The id is parsed, checked against the
 * identity pinned by a verified token (if any) and resolved through the
 * store. On success the connection is registered (presence), the personal
 * channel is joined and `connected` is sent back. Any failure leaves the
 * session `Unauthenticated` and sends `setup_error { reason }`.
 *
 * # After setup
 *
 * - `join_channel` requests are evaluated one by one, so some may succeed
 *   while others are denied
 * - `publish_message`, `typing`, `stop_typing` and `task_changed` are relayed
 *   only on channels this connection has joined, never back to the sender
 * - room access is re-evaluated before each of those relays; a connection
 *   that lost access leaves the channel and gets `join_channel_error`
 * - `ping` is answered with `pong` in any state
 *
 * Frames that arrive before setup (other than `setup` and `ping`) are logged
 * and dropped.
 *
 * # Close
 *
 * `close` unregisters the connection and announces presence; afterwards no
 * further frames are processed.
 */

use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::RealtimeHub;
use super::membership::JoinOutcome;
use super::registry::Connection;
use crate::shared::channel::{ChannelKey, ChannelKind};
use crate::shared::event::{ClientEvent, RelayedMessage, SetupPayload, TaskChangedPayload};
use crate::shared::ids::{ConnectionId, PrincipalId};
use crate::shared::messaging::Principal;
use crate::shared::RealtimeEvent;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Identified(Principal),
    /// At least one channel beyond the personal one was joined
    Joined(Principal),
    Closed,
}

impl SessionState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionState::Identified(p) | SessionState::Joined(p) => Some(p),
            SessionState::Unauthenticated | SessionState::Closed => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Identified(_) => "identified",
            SessionState::Joined(_) => "joined",
            SessionState::Closed => "closed",
        }
    }
}

pub struct Session {
    hub: RealtimeHub,
    connection: Arc<Connection>,
    /// Identity proven by a verified token, if the transport had one
    pinned: Option<PrincipalId>,
    state: SessionState,
}

impl Session {
    /// Attach a new connection that writes to `outbound`
    pub fn open(
        hub: &RealtimeHub,
        outbound: mpsc::Sender<RealtimeEvent>,
        pinned: Option<PrincipalId>,
    ) -> Self {
        let connection = Arc::new(Connection::new(outbound));
        hub.registry().attach(Arc::clone(&connection));
        tracing::debug!("[Session] Connection {} opened", connection.id());
        Self {
            hub: hub.clone(),
            connection,
            pinned,
            state: SessionState::Unauthenticated,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.state.principal()
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Process one client frame
    pub async fn handle(&mut self, event: ClientEvent) {
        if self.state == SessionState::Closed {
            tracing::debug!(
                "[Session] Ignoring {} on closed connection {}",
                event.name(),
                self.id()
            );
            return;
        }

        match event {
            ClientEvent::Setup(payload) => self.setup(payload).await,
            ClientEvent::Ping => {
                self.connection.deliver(RealtimeEvent::pong());
            }
            other => {
                let Some(principal) = self.principal().cloned() else {
                    tracing::warn!(
                        "[Session] Dropping {} from unidentified connection {}",
                        other.name(),
                        self.id()
                    );
                    return;
                };
                match other {
                    ClientEvent::JoinChannel(channel) => self.join(&principal, channel).await,
                    ClientEvent::PublishMessage(message) => {
                        self.publish_message(&principal, message).await
                    }
                    ClientEvent::Typing(channel) => self.typing(&principal, channel, true).await,
                    ClientEvent::StopTyping(channel) => {
                        self.typing(&principal, channel, false).await
                    }
                    ClientEvent::TaskChanged(payload) => {
                        self.task_changed(&principal, payload).await
                    }
                    ClientEvent::Setup(_) | ClientEvent::Ping => {}
                }
            }
        }
    }

    /// Tear the session down; safe to call more than once
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        self.connection.mark_closed();
        self.hub.presence().disconnect(self.connection.id()).await;
        tracing::debug!("[Session] Connection {} closed", self.connection.id());
    }

    async fn setup(&mut self, payload: SetupPayload) {
        let Some(raw) = payload.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
            self.reject_setup("missing principal id");
            return;
        };
        let Ok(requested) = raw.parse::<PrincipalId>() else {
            self.reject_setup("invalid principal id");
            return;
        };

        if let Some(current) = self.principal() {
            if current.id == requested {
                let ack = RealtimeEvent::connected(current, self.connection.id());
                self.connection.deliver(ack);
            } else {
                self.reject_setup("connection is already identified as another principal");
            }
            return;
        }

        if let Some(pinned) = self.pinned {
            if pinned != requested {
                self.reject_setup("principal does not match the authenticated token");
                return;
            }
        }

        let principal = match self.hub.store().find_principal(requested).await {
            Ok(Some(record)) => record.principal,
            Ok(None) => {
                self.reject_setup("unknown principal");
                return;
            }
            Err(e) => {
                tracing::error!("[Session] Principal lookup for {} failed: {}", requested, e);
                self.reject_setup("principal lookup failed");
                return;
            }
        };

        if self.connection.is_closed() {
            return;
        }

        self.hub.presence().connect(&self.connection, principal.id).await;
        self.hub
            .membership()
            .join_channel(&self.connection, &principal, ChannelKey::personal(principal.id))
            .await;
        self.connection
            .deliver(RealtimeEvent::connected(&principal, self.connection.id()));

        tracing::info!(
            "[Session] Connection {} identified as {} ({})",
            self.connection.id(),
            principal.display_name,
            principal.id
        );
        self.state = SessionState::Identified(principal);
    }

    fn reject_setup(&self, reason: &str) {
        tracing::warn!("[Session] Setup rejected on {}: {}", self.connection.id(), reason);
        self.connection.deliver(RealtimeEvent::setup_error(reason));
    }

    async fn join(&mut self, principal: &Principal, channel: ChannelKey) {
        let outcome = self
            .hub
            .membership()
            .join_channel(&self.connection, principal, channel)
            .await;
        if outcome == JoinOutcome::Joined && channel.kind != ChannelKind::Personal {
            if let SessionState::Identified(p) = &self.state {
                self.state = SessionState::Joined(p.clone());
            }
        }
    }

    async fn publish_message(&mut self, principal: &Principal, message: RelayedMessage) {
        let Some(channel) = message.channel() else {
            tracing::warn!(
                "[Session] publish_message without room or conversation id from {}",
                principal.id
            );
            return;
        };
        if !self.still_permitted(principal, channel).await {
            return;
        }

        let payload = match serde_json::to_value(&message) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("[Session] Failed to serialize relayed message: {}", e);
                return;
            }
        };
        self.hub.relay().publish(
            &channel,
            RealtimeEvent::message_received(payload),
            Some(self.connection.id()),
        );
    }

    async fn typing(&self, principal: &Principal, channel: ChannelKey, is_typing: bool) {
        if !self.still_permitted(principal, channel).await {
            return;
        }
        self.hub.relay().publish(
            &channel,
            RealtimeEvent::typing(channel, principal.id, is_typing),
            Some(self.connection.id()),
        );
    }

    async fn task_changed(&self, principal: &Principal, payload: TaskChangedPayload) {
        let channel = ChannelKey::room(payload.room_id);
        if !self.still_permitted(principal, channel).await {
            return;
        }
        self.hub.relay().publish(
            &channel,
            RealtimeEvent::task_received(payload.task),
            Some(self.connection.id()),
        );
    }

    /// Whether this connection may relay on `channel` right now
    ///
    /// The channel must be joined. Room channels are authorized again; on a
    /// denial the channel is left and the reason sent back to this connection.
    async fn still_permitted(&self, principal: &Principal, channel: ChannelKey) -> bool {
        if !self.connection.is_joined(&channel) {
            tracing::debug!("[Session] {} used unjoined {}", principal.id, channel);
            return false;
        }
        if channel.kind != ChannelKind::Room {
            return true;
        }
        match self.hub.membership().authorize(principal, channel).await {
            Ok(()) => true,
            Err(reason) => {
                self.connection.leave(&channel);
                tracing::info!(
                    "[Session] {} no longer permitted on {}: {}",
                    principal.id,
                    channel,
                    reason
                );
                self.connection
                    .deliver(RealtimeEvent::join_channel_error(channel, reason.as_str()));
                false
            }
        }
    }
}
